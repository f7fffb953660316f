use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AssetRecord;

/// Base currency assumed when the remote document does not record one.
pub const DEFAULT_BASE_CURRENCY: &str = "USD";

/// User settings stored alongside the asset list in the remote document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "Settings::default_base_currency")]
    pub base_currency: String,
    #[serde(default)]
    pub is_privacy_mode: bool,
    /// Server-assigned save timestamp, RFC 3339. Absent until the first save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl Settings {
    fn default_base_currency() -> String {
        DEFAULT_BASE_CURRENCY.to_string()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_currency: Self::default_base_currency(),
            is_privacy_mode: false,
            last_updated: None,
        }
    }
}

/// The per-user persisted document.
///
/// Deserialization is deliberately lenient: a document written by an older or
/// newer client may lack either region, and unknown fields are ignored here
/// but preserved on save by the merge write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteDocument {
    #[serde(default)]
    pub assets: Vec<AssetRecord>,
    #[serde(default)]
    pub settings: Settings,
}

impl RemoteDocument {
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

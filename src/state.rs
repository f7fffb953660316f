//! Owned application state and the browser-local preference store.
//!
//! `AppState` is the single in-memory mirror of the user's records, settings,
//! and cached rates. Components receive it by reference; nothing in the crate
//! holds global mutable state.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::models::{AssetRecord, ExchangeRateTable, RemoteDocument};
use crate::models::document::DEFAULT_BASE_CURRENCY;

/// Fixed key for the locally persisted privacy preference.
const PRIVACY_MODE_KEY: &str = "isPrivacyMode";

/// Preference file name in the cache directory.
const PREFS_FILE: &str = "prefs.json";

/// In-memory mirror of the user's financial state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub assets: Vec<AssetRecord>,
    pub base_currency: String,
    pub privacy_mode: bool,
    pub rates: ExchangeRateTable,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            assets: Vec::new(),
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            privacy_mode: false,
            rates: ExchangeRateTable::default(),
        }
    }
}

impl AppState {
    /// Apply a freshly loaded remote document.
    pub fn apply_document(&mut self, document: RemoteDocument) {
        self.assets = document.assets;
        self.base_currency = document.settings.base_currency;
        self.privacy_mode = document.settings.is_privacy_mode;
    }

    /// Total portfolio value in the base currency. Records whose currency has
    /// no known rate are counted at face value, matching the dashboard's
    /// rate-or-1 behavior.
    pub fn total_value(&self) -> f64 {
        self.assets
            .iter()
            .map(|asset| {
                let code = asset.currency.as_deref().unwrap_or(&self.base_currency);
                self.rates
                    .to_base(asset.value, code, &self.base_currency)
                    .unwrap_or(asset.value)
            })
            .sum()
    }
}

/// Per-browser local preference store, independent of the remote document.
/// Holds exactly one preference: the privacy-mode flag.
pub struct PrefStore {
    dir: PathBuf,
}

impl PrefStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn prefs_path(&self) -> PathBuf {
        self.dir.join(PREFS_FILE)
    }

    /// Read the privacy flag, defaulting to false when unset or unreadable.
    pub fn load_privacy_mode(&self) -> bool {
        let path = self.prefs_path();
        if !path.exists() {
            return false;
        }
        std::fs::read_to_string(&path)
            .ok()
            .and_then(|contents| serde_json::from_str::<Value>(&contents).ok())
            .and_then(|prefs| prefs.get(PRIVACY_MODE_KEY).and_then(Value::as_bool))
            .unwrap_or(false)
    }

    /// Persist the privacy flag under its fixed key.
    pub fn save_privacy_mode(&self, enabled: bool) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let prefs = serde_json::json!({ PRIVACY_MODE_KEY: enabled });
        std::fs::write(self.prefs_path(), serde_json::to_string_pretty(&prefs)?)
            .context("Failed to write preference file")?;
        Ok(())
    }
}

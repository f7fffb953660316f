use serde::{Deserialize, Serialize};

/// One financial record in the user's portfolio.
///
/// Optional fields are omitted from the serialized form entirely so that a
/// record round-trips through the remote document without gaining keys it
/// never had.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Currency the record is denominated in. `None` means the base currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Current value in the record's own currency.
    pub value: f64,
    /// Acquisition cost, when known. Used for gain/loss summaries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

impl AssetRecord {
    /// Minimal record with just an identity and a value.
    pub fn new(id: i64, value: f64) -> Self {
        Self {
            id,
            name: None,
            category: None,
            currency: None,
            value,
            cost: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_record_serializes_without_optional_keys() {
        let record = AssetRecord::new(1, 100.0);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"id": 1, "value": 100.0}));
    }

    #[test]
    fn test_builder_helpers_populate_fields() {
        let record = AssetRecord::new(3, 10.0).with_name("Index fund").with_currency("EUR");
        assert_eq!(record.name.as_deref(), Some("Index fund"));
        assert_eq!(record.currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn test_record_deserializes_from_sparse_document() {
        let record: AssetRecord = serde_json::from_value(serde_json::json!({
            "id": 7,
            "value": 42.5
        }))
        .unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.value, 42.5);
        assert!(record.name.is_none());
        assert!(record.currency.is_none());
    }
}

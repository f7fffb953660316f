use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cached exchange rates, keyed by currency code, expressed as multipliers
/// relative to the feed's anchor currency (the feed lists the anchor itself
/// at 1.0). Conversions between any two listed currencies cross through the
/// anchor, so the configured base currency need not match the feed's.
///
/// The table carries no staleness invariant of its own; it is replaced
/// wholesale by the periodic refresh and reused as-is when a refresh fails.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExchangeRateTable {
    rates: HashMap<String, f64>,
    last_refreshed: Option<DateTime<Utc>>,
}

impl ExchangeRateTable {
    /// Replace the table contents with a freshly fetched set of rates.
    pub fn replace(&mut self, rates: HashMap<String, f64>) {
        self.rates = rates;
        self.last_refreshed = Some(Utc::now());
    }

    /// Units of `code` per unit of `base`, crossed through the anchor.
    /// A currency always resolves to 1.0 against itself; anything else
    /// requires both codes to be listed.
    pub fn rate_for(&self, code: &str, base: &str) -> Option<f64> {
        if code.eq_ignore_ascii_case(base) {
            return Some(1.0);
        }
        let code_rate = self.rates.get(code).copied()?;
        let base_rate = self.rates.get(base).copied()?;
        Some(code_rate / base_rate)
    }

    /// Convert a value denominated in `code` into the base currency.
    /// Returns `None` when either rate is unknown.
    pub fn to_base(&self, value: f64, code: &str, base: &str) -> Option<f64> {
        self.rate_for(code, base).map(|rate| value / rate)
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }
}

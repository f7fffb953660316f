//! Periodic exchange-rate refresh.
//!
//! Rates are fetched through the injected transport on a fixed interval and
//! once at startup. A failed refresh is an ordinary network failure: it is
//! logged and the stale table keeps serving. The timer is deliberately not
//! gated on connectivity; an attempt made while offline simply fails.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::app::AppEvent;
use crate::models::ExchangeRateTable;
use crate::net::{Fetcher, Request};

/// Refresh interval in seconds. Hourly matches how often free rate feeds
/// update and keeps the dashboard close enough for valuation purposes.
pub const RATE_REFRESH_INTERVAL_SECS: u64 = 3600;

/// Default rate feed: latest multipliers relative to the base currency.
pub const DEFAULT_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";

#[derive(Debug, Deserialize)]
struct RatesPayload {
    rates: HashMap<String, f64>,
}

/// Fetch and parse the rate feed once.
pub async fn fetch_rates<F: Fetcher>(fetcher: &F, url: &str) -> Result<HashMap<String, f64>> {
    let response = fetcher
        .fetch(&Request::get(url))
        .await
        .context("Failed to fetch exchange rates")?;
    if !response.is_ok() {
        bail!("rate feed returned status {}", response.status);
    }
    let payload: RatesPayload =
        serde_json::from_slice(&response.body).context("Failed to parse rate feed")?;
    debug!(count = payload.rates.len(), "exchange rates fetched");
    Ok(payload.rates)
}

/// Human-readable freshness label for the rate-status indicator.
pub fn status_label(rates: &ExchangeRateTable, online: bool) -> String {
    match (rates.last_refreshed(), online) {
        (Some(at), true) => format!("Rates updated {}", at.format("%Y-%m-%d %H:%M UTC")),
        (Some(at), false) => format!("Offline - using rates from {}", at.format("%Y-%m-%d %H:%M UTC")),
        (None, true) => "Rates not yet loaded".to_string(),
        (None, false) => "Offline - rates unavailable".to_string(),
    }
}

/// Spawn the fixed-interval refresh task. Successful fetches are delivered to
/// the application loop as events; failures are logged here and produce no
/// event, so the stale table is simply reused.
pub fn spawn_refresh_task<F>(
    fetcher: F,
    url: String,
    events: mpsc::Sender<AppEvent>,
) -> JoinHandle<()>
where
    F: Fetcher + 'static,
{
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(RATE_REFRESH_INTERVAL_SECS));
        loop {
            interval.tick().await;
            match fetch_rates(&fetcher, &url).await {
                Ok(rates) => {
                    if events.send(AppEvent::RatesFetched(rates)).await.is_err() {
                        // Application loop is gone; stop refreshing.
                        return;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "rate refresh failed, keeping cached rates");
                }
            }
        }
    })
}

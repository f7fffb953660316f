//! Offline cache and sync core for a personal asset tracker.
//!
//! Brings up the installable cache, signs in the configured identity, and
//! runs the background event loop (rate refresh, connectivity transitions)
//! until interrupted.

mod app;
mod cache;
mod config;
mod models;
mod net;
mod rates;
mod render;
mod state;
mod sync;

use std::io;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, AppEvent, CHANNEL_BUFFER_SIZE};
use net::HttpFetcher;
use render::TraceRenderer;
use sync::HttpRemoteStore;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    info!("assetcache starting");

    let config = config::Config::load()?;
    let cache_root = config.cache_dir()?;

    let fetcher = HttpFetcher::new()?;
    let remote = HttpRemoteStore::new(config.remote_base_url.clone())?;
    let renderer = Arc::new(TraceRenderer);

    let mut app = App::new(config, cache_root, fetcher.clone(), remote, renderer);

    // Install and activate the current cache generation. A failed install
    // leaves any previous generation serving; the app still runs online.
    if let Err(e) = app.start().await {
        error!(error = %e, "offline cache unavailable, continuing without it");
    }

    // Sign in the configured identity, if any. The authentication flow itself
    // lives outside this core; we only consume the resulting identity.
    let uid = std::env::var("ASSETCACHE_UID")
        .ok()
        .or_else(|| app.config().last_uid.clone());
    match uid {
        Some(uid) => {
            if let Err(e) = app.sign_in(&uid).await {
                warn!(uid = %uid, error = %e, "sign-in load failed, keeping local state");
            }
            if let Err(e) = app.config().save() {
                warn!(error = %e, "failed to persist config");
            }
        }
        None => info!("no identity configured, running signed out"),
    }

    let (events_tx, mut events_rx) = mpsc::channel::<AppEvent>(CHANNEL_BUFFER_SIZE);
    let rates_task = rates::spawn_refresh_task(
        fetcher,
        app.config().rates_url.clone(),
        events_tx,
    );

    loop {
        tokio::select! {
            event = events_rx.recv() => {
                match event {
                    Some(event) => app.handle_event(event),
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received");
                break;
            }
        }
    }

    rates_task.abort();
    info!("assetcache shutting down");
    Ok(())
}

//! Cache-first serving of application reads.
//!
//! Every outgoing read passes through [`NetworkInterceptor::handle`]:
//!
//! - writes (non-GET) pass straight to the network and are never cached, so
//!   the remote store observes them immediately
//! - backend API reads are excluded from caching entirely; their payloads are
//!   session-specific and time-sensitive
//! - everything else is served cache-first with write-through on first fetch,
//!   falling back to the cached application shell when the network is down

use reqwest::Method;
use tracing::{debug, warn};

use crate::cache::CacheStore;

use super::{FetchError, FetchedResponse, Fetcher, Request};

/// URL fragments identifying the remote document/auth backend.
/// Requests matching any of these always go to the network.
pub const DEFAULT_BACKEND_EXCLUSIONS: &[&str] = &["firebase", "firestore.googleapis.com"];

pub struct NetworkInterceptor<F: Fetcher> {
    store: CacheStore,
    fetcher: F,
    exclusions: Vec<String>,
    shell_url: String,
}

impl<F: Fetcher> NetworkInterceptor<F> {
    pub fn new(store: CacheStore, fetcher: F, shell_url: impl Into<String>) -> Self {
        Self {
            store,
            fetcher,
            exclusions: DEFAULT_BACKEND_EXCLUSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            shell_url: shell_url.into(),
        }
    }

    pub fn with_exclusions(mut self, exclusions: Vec<String>) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    fn is_excluded(&self, url: &str) -> bool {
        self.exclusions.iter().any(|pattern| url.contains(pattern))
    }

    /// Answer one read request.
    pub async fn handle(&self, request: &Request) -> Result<FetchedResponse, FetchError> {
        // Writes are never intercepted.
        if request.method != Method::GET {
            return self.fetcher.fetch(request).await;
        }

        // Backend calls bypass the cache on both the read and write side,
        // even when a same-URL entry exists from install time. Their failures
        // also get no shell fallback: a sync error must surface as an error,
        // not as an HTML document masquerading as a backend payload.
        if self.is_excluded(&request.url) {
            debug!(url = %request.url, "backend request, bypassing cache");
            return self.fetcher.fetch(request).await;
        }

        match self.store.get(request) {
            Ok(Some(entry)) => {
                debug!(url = %request.url, "cache hit");
                return Ok(entry.into_response());
            }
            Ok(None) => {}
            Err(e) => {
                // A corrupt entry degrades to a miss.
                warn!(url = %request.url, error = %e, "cache read failed, treating as miss");
            }
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    // Write-through: store a copy, hand back the original.
                    if let Err(e) = self.store.put(request, &response) {
                        warn!(url = %request.url, error = %e, "write-through failed");
                    }
                }
                Ok(response)
            }
            Err(e) => {
                // Expected when offline: serve the shell if we have it.
                debug!(url = %request.url, error = %e, "fetch failed, trying shell fallback");
                match self.store.get(&Request::get(self.shell_url.clone())) {
                    Ok(Some(shell)) => Ok(shell.into_response()),
                    _ => Err(e),
                }
            }
        }
    }
}

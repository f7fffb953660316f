//! Remote document store backends and merge-write semantics.
//!
//! A save must not clobber remote fields this client does not model, so both
//! backends write via [`merge_value`]: object fields are merged recursively,
//! everything else is replaced. The in-memory backend merges locally; the
//! HTTP backend performs read-merge-write against the document resource.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

/// Sentinel the client writes where the backend must substitute its own
/// clock, mirroring a server-assigned timestamp field.
pub const SERVER_TIMESTAMP: &str = "__serverTimestamp__";

/// HTTP request timeout in seconds for document reads and writes.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Merge `patch` into `target`. Objects merge key-by-key recursively; any
/// other value (including arrays) replaces the target wholesale.
pub fn merge_value(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target_map), Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                merge_value(
                    target_map.entry(key.clone()).or_insert(Value::Null),
                    patch_value,
                );
            }
        }
        (target_slot, patch_value) => {
            *target_slot = patch_value.clone();
        }
    }
}

/// Replace every [`SERVER_TIMESTAMP`] sentinel in `value` with `now`.
pub fn resolve_server_timestamps(value: &mut Value, now: DateTime<Utc>) {
    if value.as_str() == Some(SERVER_TIMESTAMP) {
        *value = Value::String(now.to_rfc3339());
        return;
    }
    match value {
        Value::Object(map) => {
            for nested in map.values_mut() {
                resolve_server_timestamps(nested, now);
            }
        }
        Value::Array(items) => {
            for nested in items.iter_mut() {
                resolve_server_timestamps(nested, now);
            }
        }
        _ => {}
    }
}

/// The injected document-store capability, one document per user identity.
pub trait RemoteStore: Send + Sync {
    /// Read the user's document. `Ok(None)` means the document does not exist
    /// yet - a new profile, not an error.
    fn load_document(&self, uid: &str) -> impl Future<Output = Result<Option<Value>>> + Send;

    /// Merge-write `patch` into the user's document, creating it if absent.
    fn merge_document(&self, uid: &str, patch: Value) -> impl Future<Output = Result<()>> + Send;
}

/// In-memory backend used by tests and offline demos.
/// Counts every store call so tests can assert "zero remote calls".
#[derive(Default)]
pub struct MemoryRemoteStore {
    documents: Mutex<HashMap<String, Value>>,
    calls: AtomicUsize,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document, e.g. an existing user profile. Not counted as a call.
    pub fn seed(&self, uid: &str, document: Value) {
        self.documents.lock().unwrap().insert(uid.to_string(), document);
    }

    pub fn document(&self, uid: &str) -> Option<Value> {
        self.documents.lock().unwrap().get(uid).cloned()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RemoteStore for MemoryRemoteStore {
    async fn load_document(&self, uid: &str) -> Result<Option<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.documents.lock().unwrap().get(uid).cloned())
    }

    async fn merge_document(&self, uid: &str, patch: Value) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut patch = patch;
        resolve_server_timestamps(&mut patch, Utc::now());

        let mut documents = self.documents.lock().unwrap();
        let target = documents
            .entry(uid.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
        merge_value(target, &patch);
        Ok(())
    }
}

/// Document store over a REST backend: one resource per user at
/// `{base}/users/{uid}`, 404 meaning the document does not exist yet.
///
/// The merge is performed read-merge-write on the client so the semantics do
/// not depend on backend PATCH support; concurrent writers are last-write-wins,
/// same as the source system.
#[derive(Clone)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemoteStore {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client for remote store")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn document_url(&self, uid: &str) -> String {
        format!("{}/users/{}", self.base_url, uid)
    }
}

impl RemoteStore for HttpRemoteStore {
    async fn load_document(&self, uid: &str) -> Result<Option<Value>> {
        let url = self.document_url(uid);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to read remote document: {}", url))?;

        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            bail!("remote document read failed with status {}", response.status());
        }

        let document: Value = response
            .json()
            .await
            .context("Failed to parse remote document")?;
        debug!(uid, "remote document loaded");
        Ok(Some(document))
    }

    async fn merge_document(&self, uid: &str, patch: Value) -> Result<()> {
        let mut document = self
            .load_document(uid)
            .await?
            .unwrap_or_else(|| Value::Object(Default::default()));

        let mut patch = patch;
        resolve_server_timestamps(&mut patch, Utc::now());
        merge_value(&mut document, &patch);

        let url = self.document_url(uid);
        let response = self
            .client
            .put(&url)
            .json(&document)
            .send()
            .await
            .with_context(|| format!("Failed to write remote document: {}", url))?;

        if !response.status().is_success() {
            bail!("remote document write failed with status {}", response.status());
        }
        debug!(uid, "remote document merged");
        Ok(())
    }
}

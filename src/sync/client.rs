//! Load/save bridge between local state and the remote document.

use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::RemoteDocument;
use crate::rates;
use crate::render::Renderer;
use crate::state::AppState;

use super::{RemoteStore, SERVER_TIMESTAMP};

#[derive(Error, Debug)]
pub enum SyncError {
    /// A save was requested with no active session. Rejected synchronously;
    /// nothing is queued or retried.
    #[error("not signed in - remote save rejected")]
    NotSignedIn,

    #[error("remote store error: {0}")]
    Store(#[source] anyhow::Error),

    #[error("malformed remote document: {0}")]
    Document(#[source] serde_json::Error),
}

/// Live association between an authenticated identity and its remote document.
/// Created on sign-in, dropped on sign-out; all remote I/O requires one.
#[derive(Debug, Clone)]
pub struct Session {
    pub uid: String,
    pub signed_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            signed_in_at: Utc::now(),
        }
    }
}

/// What a load produced, for callers that care about the distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Document found and applied.
    Loaded,
    /// No document yet: new profile, local state reset to empty.
    NewProfile,
    /// No session: local state reset to empty, no remote call made.
    SignedOut,
}

pub struct RemoteSyncClient<S: RemoteStore> {
    store: S,
}

impl<S: RemoteStore> RemoteSyncClient<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load the user's persisted state. Called once per successful sign-in.
    ///
    /// A remote failure leaves `state` exactly as it was; success (including
    /// the document-not-found new-profile case) triggers a full re-render and
    /// a rate-status refresh as the completion signal.
    pub async fn load(
        &self,
        session: Option<&Session>,
        state: &mut AppState,
        renderer: &dyn Renderer,
    ) -> Result<LoadOutcome, SyncError> {
        let Some(session) = session else {
            // Unauthenticated: empty asset list, render, no remote call.
            state.assets.clear();
            renderer.render_all(state);
            return Ok(LoadOutcome::SignedOut);
        };

        let document = match self.store.load_document(&session.uid).await {
            Ok(document) => document,
            Err(e) => {
                warn!(uid = %session.uid, error = %e, "failed to load remote document");
                return Err(SyncError::Store(e));
            }
        };

        let outcome = match document {
            Some(value) => {
                let document =
                    RemoteDocument::from_value(value).map_err(SyncError::Document)?;
                info!(
                    uid = %session.uid,
                    assets = document.assets.len(),
                    currency = %document.settings.base_currency,
                    "remote document loaded"
                );
                state.apply_document(document);
                LoadOutcome::Loaded
            }
            None => {
                info!(uid = %session.uid, "no remote document, initializing new profile");
                state.assets.clear();
                LoadOutcome::NewProfile
            }
        };

        renderer.render_all(state);
        renderer.set_rate_status(&rates::status_label(&state.rates, true));
        Ok(outcome)
    }

    /// Persist current state back to the remote document with merge
    /// semantics. Success and failure are both terminal for this call.
    pub async fn save(
        &self,
        session: Option<&Session>,
        state: &AppState,
    ) -> Result<(), SyncError> {
        let Some(session) = session else {
            warn!("cannot save: no active session");
            return Err(SyncError::NotSignedIn);
        };

        let patch = json!({
            "assets": state.assets,
            "settings": {
                "baseCurrency": state.base_currency,
                "isPrivacyMode": state.privacy_mode,
                "lastUpdated": SERVER_TIMESTAMP,
            }
        });

        match self.store.merge_document(&session.uid, patch).await {
            Ok(()) => {
                info!(uid = %session.uid, assets = state.assets.len(), "state saved");
                Ok(())
            }
            Err(e) => {
                warn!(uid = %session.uid, error = %e, "failed to save state");
                Err(SyncError::Store(e))
            }
        }
    }
}

//! Application composition root.
//!
//! `App` owns the components and the single `AppState`, and sequences the
//! startup and sync flows: bring up the cache lifecycle, sign in, load the
//! remote document, save after every mutation, and react to connectivity and
//! rate events delivered by background tasks.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cache::{AssetManifest, LifecycleManager, CURRENT_GENERATION};
use crate::config::Config;
use crate::models::AssetRecord;
use crate::net::{ConnectivityEvent, ConnectivityMonitor, Fetcher, NetworkInterceptor};
use crate::rates;
use crate::render::SharedRenderer;
use crate::state::{AppState, PrefStore};
use crate::sync::{LoadOutcome, RemoteStore, RemoteSyncClient, Session, SyncError};

/// Buffer size for the background event channel.
/// Rate updates and connectivity transitions are rare; 32 is ample headroom.
pub const CHANNEL_BUFFER_SIZE: usize = 32;

/// Events delivered to the application loop by background tasks and the
/// embedding platform.
#[derive(Debug)]
pub enum AppEvent {
    Connectivity(ConnectivityEvent),
    RatesFetched(HashMap<String, f64>),
}

pub struct App<F: Fetcher + Clone, S: RemoteStore> {
    config: Config,
    lifecycle: LifecycleManager<F>,
    interceptor: Option<NetworkInterceptor<F>>,
    connectivity: ConnectivityMonitor,
    sync: RemoteSyncClient<S>,
    prefs: PrefStore,
    renderer: SharedRenderer,
    fetcher: F,
    session: Option<Session>,
    pub state: AppState,
}

impl<F: Fetcher + Clone, S: RemoteStore> App<F, S> {
    pub fn new(
        config: Config,
        cache_root: PathBuf,
        fetcher: F,
        remote: S,
        renderer: SharedRenderer,
    ) -> Self {
        let manifest = AssetManifest::standard(&config.origin);
        let lifecycle =
            LifecycleManager::new(cache_root.clone(), fetcher.clone(), manifest);
        let prefs = PrefStore::new(cache_root);

        let mut state = AppState::default();
        state.privacy_mode = prefs.load_privacy_mode();

        Self {
            connectivity: ConnectivityMonitor::new(renderer.clone()),
            sync: RemoteSyncClient::new(remote),
            lifecycle,
            interceptor: None,
            prefs,
            renderer,
            fetcher,
            config,
            session: None,
            state,
        }
    }

    /// Bring the cache layer to a ready state: install the current
    /// generation, retire stale ones, and start intercepting reads.
    ///
    /// An install failure is surfaced to the caller; any previously active
    /// generation keeps serving in that case.
    pub async fn start(&mut self) -> Result<()> {
        let store = self
            .lifecycle
            .bring_up(CURRENT_GENERATION)
            .await
            .context("Cache lifecycle bring-up failed")?;

        let shell = self.lifecycle.manifest().shell_url().to_string();
        let interceptor = NetworkInterceptor::new(store, self.fetcher.clone(), shell)
            .with_exclusions(self.config.backend_exclusions.clone());
        self.interceptor = Some(interceptor);
        info!(generation = CURRENT_GENERATION, "offline cache ready");
        Ok(())
    }

    /// The request-serving surface for the embedding shell, available once
    /// `start` has succeeded.
    pub fn interceptor(&self) -> Option<&NetworkInterceptor<F>> {
        self.interceptor.as_ref()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Establish a session for `uid` and load its persisted state.
    pub async fn sign_in(&mut self, uid: &str) -> Result<LoadOutcome, SyncError> {
        self.session = Some(Session::new(uid));
        self.config.last_uid = Some(uid.to_string());
        self.sync
            .load(self.session.as_ref(), &mut self.state, self.renderer.as_ref())
            .await
    }

    /// Drop the session and reset to the unauthenticated empty state.
    pub async fn sign_out(&mut self) {
        self.session = None;
        // Load without a session resets the asset list and re-renders.
        let _ = self
            .sync
            .load(None, &mut self.state, self.renderer.as_ref())
            .await;
    }

    async fn save(&self) -> Result<(), SyncError> {
        self.sync.save(self.session.as_ref(), &self.state).await
    }

    /// Add a record and persist. The local mutation sticks even if the save
    /// fails; there is no offline queue and no retry.
    pub async fn add_asset(&mut self, asset: AssetRecord) -> Result<(), SyncError> {
        self.state.assets.push(asset);
        self.renderer.render_all(&self.state);
        self.save().await
    }

    pub async fn remove_asset(&mut self, id: i64) -> Result<(), SyncError> {
        self.state.assets.retain(|a| a.id != id);
        self.renderer.render_all(&self.state);
        self.save().await
    }

    pub async fn set_base_currency(&mut self, code: &str) -> Result<(), SyncError> {
        self.state.base_currency = code.to_string();
        self.renderer.render_all(&self.state);
        self.save().await
    }

    /// Flip privacy mode, persist it locally, and mirror it to the remote
    /// settings region.
    pub async fn toggle_privacy_mode(&mut self) -> Result<(), SyncError> {
        self.state.privacy_mode = !self.state.privacy_mode;
        if let Err(e) = self.prefs.save_privacy_mode(self.state.privacy_mode) {
            warn!(error = %e, "failed to persist privacy preference");
        }
        self.renderer.render_all(&self.state);
        self.save().await
    }

    /// Dispatch one background event.
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Connectivity(transition) => {
                self.connectivity.apply(transition);
                self.update_rate_status();
            }
            AppEvent::RatesFetched(rates) => {
                self.state.rates.replace(rates);
                self.renderer.render_all(&self.state);
                self.update_rate_status();
            }
        }
    }

    fn update_rate_status(&self) {
        let label = rates::status_label(&self.state.rates, self.connectivity.is_online());
        self.renderer.set_rate_status(&label);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use serde_json::json;

    use crate::net::{FetchError, FetchedResponse, Request};
    use crate::render::testing::CountingRenderer;
    use crate::sync::MemoryRemoteStore;

    /// Transport that serves every URL with a small OK body.
    #[derive(Clone, Default)]
    struct AlwaysOkFetcher {
        calls: Arc<AtomicU64>,
    }

    impl Fetcher for AlwaysOkFetcher {
        async fn fetch(&self, request: &Request) -> Result<FetchedResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FetchedResponse::ok(format!("body of {}", request.url)))
        }
    }

    fn test_app(
        tmp: &tempfile::TempDir,
        store: MemoryRemoteStore,
    ) -> (App<AlwaysOkFetcher, MemoryRemoteStore>, Arc<CountingRenderer>) {
        let renderer = Arc::new(CountingRenderer::default());
        let app = App::new(
            Config::default(),
            tmp.path().to_path_buf(),
            AlwaysOkFetcher::default(),
            store,
            renderer.clone(),
        );
        (app, renderer)
    }

    #[tokio::test]
    async fn test_start_installs_and_activates_current_generation() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut app, _renderer) = test_app(&tmp, MemoryRemoteStore::new());

        app.start().await.unwrap();

        assert!(app.interceptor().is_some());
        assert_eq!(
            crate::cache::CacheStore::list_generations(tmp.path()).unwrap(),
            vec![CURRENT_GENERATION.to_string()]
        );
    }

    #[tokio::test]
    async fn test_sign_in_load_mutate_save_end_to_end() {
        let tmp = tempfile::tempdir().unwrap();
        let store = MemoryRemoteStore::new();
        store.seed(
            "U1",
            json!({"assets": [], "settings": {"baseCurrency": "EUR"}}),
        );
        let (mut app, _renderer) = test_app(&tmp, store);

        let outcome = app.sign_in("U1").await.unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded);
        assert!(app.state.assets.is_empty());
        assert_eq!(app.state.base_currency, "EUR");
        assert!(!app.state.privacy_mode);

        app.add_asset(AssetRecord::new(1, 100.0)).await.unwrap();

        let doc = app.sync.store().document("U1").unwrap();
        assert_eq!(doc["assets"], json!([{"id": 1, "value": 100.0}]));
        assert_eq!(doc["settings"]["baseCurrency"], "EUR");
        assert_eq!(doc["settings"]["isPrivacyMode"], json!(false));
        assert!(doc["settings"]["lastUpdated"].is_string());
    }

    #[tokio::test]
    async fn test_mutation_without_session_keeps_local_change_but_rejects_save() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut app, _renderer) = test_app(&tmp, MemoryRemoteStore::new());

        let result = app.add_asset(AssetRecord::new(1, 10.0)).await;

        assert!(matches!(result, Err(SyncError::NotSignedIn)));
        assert_eq!(app.state.assets.len(), 1);
        assert_eq!(app.sync.store().call_count(), 0);
    }

    #[tokio::test]
    async fn test_remove_asset_and_currency_change_persist() {
        let tmp = tempfile::tempdir().unwrap();
        let store = MemoryRemoteStore::new();
        store.seed(
            "U1",
            json!({"assets": [{"id": 1, "value": 5.0}, {"id": 2, "value": 7.0}]}),
        );
        let (mut app, _renderer) = test_app(&tmp, store);
        app.sign_in("U1").await.unwrap();

        app.remove_asset(1).await.unwrap();
        app.set_base_currency("EUR").await.unwrap();

        let doc = app.sync.store().document("U1").unwrap();
        assert_eq!(doc["assets"], json!([{"id": 2, "value": 7.0}]));
        assert_eq!(doc["settings"]["baseCurrency"], "EUR");
    }

    #[tokio::test]
    async fn test_sign_out_resets_assets() {
        let tmp = tempfile::tempdir().unwrap();
        let store = MemoryRemoteStore::new();
        store.seed("U1", json!({"assets": [{"id": 1, "value": 5.0}]}));
        let (mut app, _renderer) = test_app(&tmp, store);

        app.sign_in("U1").await.unwrap();
        assert_eq!(app.state.assets.len(), 1);

        app.sign_out().await;
        assert!(app.session().is_none());
        assert!(app.state.assets.is_empty());
    }

    #[tokio::test]
    async fn test_connectivity_events_drive_banner_and_rate_label() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut app, renderer) = test_app(&tmp, MemoryRemoteStore::new());

        app.handle_event(AppEvent::Connectivity(ConnectivityEvent::Offline));
        assert!(!app.is_online());
        assert!(renderer.banner_visible.lock().unwrap().is_some());
        assert!(renderer
            .rate_labels
            .lock()
            .unwrap()
            .last()
            .unwrap()
            .starts_with("Offline"));

        app.handle_event(AppEvent::Connectivity(ConnectivityEvent::Online));
        assert!(app.is_online());
        assert!(renderer.banner_visible.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rate_event_updates_table_and_rerenders() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut app, renderer) = test_app(&tmp, MemoryRemoteStore::new());
        let before = renderer.render_count();

        app.handle_event(AppEvent::RatesFetched(HashMap::from([
            ("USD".to_string(), 1.0),
            ("EUR".to_string(), 0.92),
        ])));

        assert_eq!(app.state.rates.rate_for("EUR", "USD"), Some(0.92));
        assert_eq!(renderer.render_count(), before + 1);
    }

    #[tokio::test]
    async fn test_privacy_toggle_persists_locally() {
        let tmp = tempfile::tempdir().unwrap();
        let store = MemoryRemoteStore::new();
        store.seed("U1", json!({}));
        let (mut app, _renderer) = test_app(&tmp, store);

        app.sign_in("U1").await.unwrap();
        app.toggle_privacy_mode().await.unwrap();
        assert!(app.state.privacy_mode);

        // A fresh App over the same cache root sees the persisted preference.
        let (app2, _renderer2) = test_app(&tmp, MemoryRemoteStore::new());
        assert!(app2.state.privacy_mode);
    }
}

//! Install/activate lifecycle for cache generations.
//!
//! The manager walks a fixed state machine:
//!
//! `Uninstalled -> Installing -> Installed(N) -> Activating -> Active(N)`
//!
//! and on redeploy `Active(N) -> Installing(N+1) -> ... -> Active(N+1)`,
//! where `Active(N)` is torn down only during the second activate pass.
//! Activation deletes stale generations before claiming open clients; that
//! ordering is load-bearing (claiming first would leak the old generation).

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::net::{FetchedResponse, Fetcher, Request};

use super::store::STAGING_SUFFIX;
use super::{AssetManifest, CacheStore};

/// Maximum concurrent fetches while populating a generation.
/// Limits parallel requests to avoid overwhelming CDNs during install.
const MAX_CONCURRENT_INSTALL_FETCHES: usize = 8;

/// Lifecycle position of the cache layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    Uninstalled,
    Installing,
    Installed(String),
    Activating,
    Active(String),
}

/// Open application sessions and the generation controlling each.
///
/// A freshly registered client is uncontrolled until the next activate pass
/// claims it; claiming retargets already-open sessions at the new generation
/// without a reload.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    controllers: BTreeMap<u64, Option<String>>,
}

impl ClientRegistry {
    pub fn register(&mut self, client_id: u64) {
        self.controllers.entry(client_id).or_insert(None);
    }

    /// Point every open client at `generation`. Returns how many were claimed.
    pub fn claim(&mut self, generation: &str) -> usize {
        for controller in self.controllers.values_mut() {
            *controller = Some(generation.to_string());
        }
        self.controllers.len()
    }

    pub fn controller_of(&self, client_id: u64) -> Option<&str> {
        self.controllers.get(&client_id)?.as_deref()
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

/// Owns install and activate transitions for the cache root.
pub struct LifecycleManager<F: Fetcher> {
    root: PathBuf,
    fetcher: F,
    manifest: AssetManifest,
    state: LifecycleState,
    clients: ClientRegistry,
}

impl<F: Fetcher> LifecycleManager<F> {
    pub fn new(root: PathBuf, fetcher: F, manifest: AssetManifest) -> Self {
        Self {
            root,
            fetcher,
            manifest,
            state: LifecycleState::Uninstalled,
            clients: ClientRegistry::default(),
        }
    }

    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    pub fn clients_mut(&mut self) -> &mut ClientRegistry {
        &mut self.clients
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    /// Generation currently serving, if any.
    pub fn active_generation(&self) -> Option<&str> {
        match &self.state {
            LifecycleState::Active(generation) => Some(generation),
            _ => None,
        }
    }

    /// Populate a fresh generation from the manifest.
    ///
    /// Every manifest URL must fetch successfully. The fetches land in a
    /// staging directory that is renamed into place only once complete, so a
    /// failure costs nothing already on disk: the staging directory is
    /// deleted, an existing generation of the same name keeps its entries,
    /// the previous state is restored (a stale `Active` generation keeps
    /// serving), and the error is returned. On success the manager moves to
    /// `Installed` and the caller is expected to activate immediately - there
    /// is no waiting phase.
    pub async fn install(&mut self, generation: &str) -> Result<()> {
        match &self.state {
            LifecycleState::Uninstalled
            | LifecycleState::Installed(_)
            | LifecycleState::Active(_) => {}
            other => bail!("install not permitted from state {:?}", other),
        }

        info!(generation, assets = self.manifest.len(), "installing cache generation");
        let prior = std::mem::replace(&mut self.state, LifecycleState::Installing);
        let staging = format!("{}{}", generation, STAGING_SUFFIX);

        let populated = match self.populate(&staging).await {
            Ok(()) => CacheStore::promote_generation(&self.root, &staging, generation),
            Err(e) => Err(e),
        };

        match populated {
            Ok(()) => {
                self.state = LifecycleState::Installed(generation.to_string());
                info!(generation, "cache generation installed");
                Ok(())
            }
            Err(e) => {
                // A partially populated staging dir must never be promoted.
                if let Err(cleanup) = CacheStore::delete_generation(&self.root, &staging) {
                    warn!(generation, error = %cleanup, "failed to remove staging directory");
                }
                self.state = prior;
                Err(e).with_context(|| format!("Install failed for generation {}", generation))
            }
        }
    }

    async fn populate(&self, generation: &str) -> Result<()> {
        let store = CacheStore::open(&self.root, generation)?;

        let results: Vec<Result<()>> = stream::iter(self.manifest.urls().iter().cloned())
            .map(|url| {
                let fetcher = &self.fetcher;
                let store = &store;
                async move {
                    let request = Request::get(url.clone());
                    let response: FetchedResponse = fetcher
                        .fetch(&request)
                        .await
                        .with_context(|| format!("Failed to fetch manifest asset: {}", url))?;
                    if !response.is_ok() {
                        bail!("manifest asset {} returned status {}", url, response.status);
                    }
                    store.put(&request, &response)?;
                    debug!(url = %url, "manifest asset cached");
                    Ok(())
                }
            })
            .buffer_unordered(MAX_CONCURRENT_INSTALL_FETCHES)
            .collect()
            .await;

        for result in results {
            result?;
        }
        Ok(())
    }

    /// Retire superseded generations and take over open clients.
    ///
    /// Stale generations are deleted first, then every registered client is
    /// claimed by the new generation. Only valid from `Installed`.
    pub fn activate(&mut self) -> Result<()> {
        let generation = match std::mem::replace(&mut self.state, LifecycleState::Activating) {
            LifecycleState::Installed(generation) => generation,
            other => {
                self.state = other;
                bail!("activate not permitted from state {:?}", self.state);
            }
        };

        for name in CacheStore::list_generations(&self.root)? {
            if name != generation {
                info!(stale = %name, "deleting old cache generation");
                CacheStore::delete_generation(&self.root, &name)?;
            }
        }

        let claimed = self.clients.claim(&generation);
        info!(generation = %generation, clients = claimed, "cache generation active");
        self.state = LifecycleState::Active(generation);
        Ok(())
    }

    /// Install then activate in one ordered pass, returning the open store
    /// for the now-active generation.
    pub async fn bring_up(&mut self, generation: &str) -> Result<CacheStore> {
        self.install(generation).await?;
        self.activate()?;
        CacheStore::open(&self.root, generation)
    }
}

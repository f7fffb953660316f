//! Installable-cache module for offline shell serving.
//!
//! This module provides:
//! - `CacheStore`: one named, versioned generation of captured responses
//! - `AssetManifest`: the static list of shell resources to pre-cache
//! - `LifecycleManager`: the install/activate state machine that brings a
//!   generation to readiness and retires superseded ones

pub mod lifecycle;
pub mod manifest;
pub mod store;

pub use lifecycle::{ClientRegistry, LifecycleManager, LifecycleState};
pub use manifest::AssetManifest;
pub use store::{CacheEntry, CacheStore};

/// Name of the cache generation this build installs.
/// Bump the version suffix when the shell asset set changes; the next
/// activate pass deletes every generation that does not match.
pub const CURRENT_GENERATION: &str = "assetcache-v1";

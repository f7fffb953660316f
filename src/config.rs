//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the remote store endpoint, the rate feed URL, and the last
//! signed-in identity.
//!
//! Configuration is stored at `~/.config/assetcache/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::net::interceptor::DEFAULT_BACKEND_EXCLUSIONS;
use crate::rates::DEFAULT_RATES_URL;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "assetcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default remote document store endpoint.
const DEFAULT_REMOTE_BASE_URL: &str = "https://firestore.googleapis.com/v1/assetcache";

/// Origin the shell assets are served from.
const DEFAULT_ORIGIN: &str = "https://tracker.local";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the remote document store.
    pub remote_base_url: String,
    /// Exchange-rate feed URL.
    pub rates_url: String,
    /// Origin the application shell is served from.
    pub origin: String,
    /// URL fragments that must never be served from cache.
    pub backend_exclusions: Vec<String>,
    /// Identity of the last signed-in user, for automatic sign-in.
    pub last_uid: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_base_url: DEFAULT_REMOTE_BASE_URL.to_string(),
            rates_url: DEFAULT_RATES_URL.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            backend_exclusions: DEFAULT_BACKEND_EXCLUSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            last_uid: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_backend_exclusions() {
        let config = Config::default();
        assert!(config
            .backend_exclusions
            .iter()
            .any(|p| p == "firestore.googleapis.com"));
        assert!(config.last_uid.is_none());
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let mut config = Config::default();
        config.last_uid = Some("u1".to_string());
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.last_uid.as_deref(), Some("u1"));
        assert_eq!(back.rates_url, config.rates_url);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"last_uid": "u2"}"#).unwrap();
        assert_eq!(config.last_uid.as_deref(), Some("u2"));
        assert_eq!(config.rates_url, DEFAULT_RATES_URL);
    }
}

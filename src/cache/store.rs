//! On-disk store for one cache generation.
//!
//! A generation is a directory under the cache root named after the
//! generation identifier. Each entry is a single JSON file holding the
//! captured response plus its request identity, named by the SHA-256 of
//! `"METHOD url"` so arbitrary URLs map to safe file names.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::net::{FetchedResponse, Request};

/// Suffix marking a generation directory still being populated. Staging
/// directories are invisible to [`CacheStore::list_generations`] and only
/// become real generations through [`CacheStore::promote_generation`].
pub(crate) const STAGING_SUFFIX: &str = ".staging";

/// A captured response stored under a request identity.
///
/// Only successful GET responses are ever stored (enforced by [`CacheStore::put`]);
/// a refreshed entry overwrites the previous one in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub body: Vec<u8>,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn into_response(self) -> FetchedResponse {
        FetchedResponse {
            status: self.status,
            body: self.body,
        }
    }
}

/// One named cache generation backed by a directory of entry files.
pub struct CacheStore {
    dir: PathBuf,
    generation: String,
}

impl CacheStore {
    /// Open (creating if needed) the store for `generation` under `root`.
    pub fn open(root: &Path, generation: &str) -> Result<Self> {
        let dir = root.join(generation);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache generation dir: {}", generation))?;
        Ok(Self {
            dir,
            generation: generation.to_string(),
        })
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }

    fn entry_path(&self, request: &Request) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(request.method.as_str().as_bytes());
        hasher.update(b" ");
        hasher.update(request.url.as_bytes());
        let key = hex::encode(hasher.finalize());
        self.dir.join(format!("{}.json", key))
    }

    /// Look up the entry stored under a request identity.
    pub fn get(&self, request: &Request) -> Result<Option<CacheEntry>> {
        let path = self.entry_path(request);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache entry for {}", request.url))?;
        let entry: CacheEntry = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache entry for {}", request.url))?;
        Ok(Some(entry))
    }

    pub fn contains(&self, request: &Request) -> bool {
        self.entry_path(request).exists()
    }

    /// Store a response under a request identity, overwriting any prior entry.
    ///
    /// Rejects anything but a successful GET: the cache must never serve a
    /// write or an error page.
    pub fn put(&self, request: &Request, response: &FetchedResponse) -> Result<()> {
        if request.method != Method::GET {
            bail!("refusing to cache non-GET request: {} {}", request.method, request.url);
        }
        if !response.is_ok() {
            bail!(
                "refusing to cache non-success response ({}) for {}",
                response.status,
                request.url
            );
        }

        let entry = CacheEntry {
            method: request.method.as_str().to_string(),
            url: request.url.clone(),
            status: response.status,
            body: response.body.clone(),
            stored_at: Utc::now(),
        };
        let contents = serde_json::to_string(&entry)?;
        std::fs::write(self.entry_path(request), contents)
            .with_context(|| format!("Failed to write cache entry for {}", request.url))?;
        debug!(generation = %self.generation, url = %request.url, "cached response");
        Ok(())
    }

    /// URLs of all stored entries, unordered.
    pub fn urls(&self) -> Result<Vec<String>> {
        let mut urls = Vec::new();
        for dirent in std::fs::read_dir(&self.dir)? {
            let path = dirent?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let contents = std::fs::read_to_string(&path)?;
            let entry: CacheEntry = serde_json::from_str(&contents)
                .with_context(|| format!("Corrupt cache entry: {}", path.display()))?;
            urls.push(entry.url);
        }
        Ok(urls)
    }

    pub fn entry_count(&self) -> Result<usize> {
        Ok(self.urls()?.len())
    }

    /// Names of every generation directory under `root`.
    /// Staging directories are not generations and are never listed.
    pub fn list_generations(root: &Path) -> Result<Vec<String>> {
        let mut names = Vec::new();
        if !root.exists() {
            return Ok(names);
        }
        for dirent in std::fs::read_dir(root)? {
            let dirent = dirent?;
            if dirent.file_type()?.is_dir() {
                if let Some(name) = dirent.file_name().to_str() {
                    if name.ends_with(STAGING_SUFFIX) {
                        continue;
                    }
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Replace `generation` with the fully populated `staging` directory.
    /// Any prior generation of that name is removed only here, after staging
    /// has completed, so a failed populate never costs the existing entries.
    pub fn promote_generation(root: &Path, staging: &str, generation: &str) -> Result<()> {
        let from = root.join(staging);
        let to = root.join(generation);
        if to.exists() {
            std::fs::remove_dir_all(&to)
                .with_context(|| format!("Failed to retire cache generation: {}", generation))?;
        }
        std::fs::rename(&from, &to)
            .with_context(|| format!("Failed to promote cache generation: {}", generation))?;
        Ok(())
    }

    /// Delete a whole generation by name.
    pub fn delete_generation(root: &Path, generation: &str) -> Result<()> {
        let dir = root.join(generation);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)
                .with_context(|| format!("Failed to delete cache generation: {}", generation))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::FetchedResponse;

    fn store(dir: &Path) -> CacheStore {
        CacheStore::open(dir, "test-v1").unwrap()
    }

    #[test]
    fn test_put_then_get_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path());
        let request = Request::get("https://example.com/app.js");

        store.put(&request, &FetchedResponse::ok("console.log(1)")).unwrap();

        let entry = store.get(&request).unwrap().unwrap();
        assert_eq!(entry.url, "https://example.com/app.js");
        assert_eq!(entry.status, 200);
        assert_eq!(entry.body, b"console.log(1)");
    }

    #[test]
    fn test_get_missing_entry_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path());
        assert!(store.get(&Request::get("https://example.com/missing")).unwrap().is_none());
    }

    #[test]
    fn test_put_overwrites_same_identity() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path());
        let request = Request::get("https://example.com/style.css");

        store.put(&request, &FetchedResponse::ok("old")).unwrap();
        store.put(&request, &FetchedResponse::ok("new")).unwrap();

        assert_eq!(store.entry_count().unwrap(), 1);
        assert_eq!(store.get(&request).unwrap().unwrap().body, b"new");
    }

    #[test]
    fn test_put_rejects_non_get() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path());
        let request = Request::new(Method::POST, "https://example.com/save");
        assert!(store.put(&request, &FetchedResponse::ok("x")).is_err());
        assert!(!store.contains(&request));
    }

    #[test]
    fn test_put_rejects_error_status() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path());
        let request = Request::get("https://example.com/404");
        let response = FetchedResponse { status: 404, body: vec![] };
        assert!(store.put(&request, &response).is_err());
    }

    #[test]
    fn test_list_and_delete_generations() {
        let tmp = tempfile::tempdir().unwrap();
        let _a = CacheStore::open(tmp.path(), "gen-a").unwrap();
        let _b = CacheStore::open(tmp.path(), "gen-b").unwrap();

        assert_eq!(
            CacheStore::list_generations(tmp.path()).unwrap(),
            vec!["gen-a".to_string(), "gen-b".to_string()]
        );

        CacheStore::delete_generation(tmp.path(), "gen-a").unwrap();
        assert_eq!(
            CacheStore::list_generations(tmp.path()).unwrap(),
            vec!["gen-b".to_string()]
        );
    }

    #[test]
    fn test_list_generations_skips_staging_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let _real = CacheStore::open(tmp.path(), "gen-a").unwrap();
        let _staging = CacheStore::open(tmp.path(), "gen-b.staging").unwrap();

        assert_eq!(
            CacheStore::list_generations(tmp.path()).unwrap(),
            vec!["gen-a".to_string()]
        );
    }

    #[test]
    fn test_promote_replaces_existing_generation() {
        let tmp = tempfile::tempdir().unwrap();
        let request = Request::get("https://example.com/app.js");

        let old = CacheStore::open(tmp.path(), "gen-a").unwrap();
        old.put(&request, &FetchedResponse::ok("old")).unwrap();
        let staging = CacheStore::open(tmp.path(), "gen-a.staging").unwrap();
        staging.put(&request, &FetchedResponse::ok("new")).unwrap();

        CacheStore::promote_generation(tmp.path(), "gen-a.staging", "gen-a").unwrap();

        let promoted = CacheStore::open(tmp.path(), "gen-a").unwrap();
        assert_eq!(promoted.get(&request).unwrap().unwrap().body, b"new");
        assert_eq!(
            CacheStore::list_generations(tmp.path()).unwrap(),
            vec!["gen-a".to_string()]
        );
    }

    #[test]
    fn test_list_generations_on_missing_root_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");
        assert!(CacheStore::list_generations(&missing).unwrap().is_empty());
    }
}

//! The static list of resources the application shell needs offline.

/// Ordered list of shell resources to pre-cache at install time.
///
/// Built once at startup and never mutated. The shell URL is the resource
/// served as a fallback when a non-cached GET fails on the network.
#[derive(Debug, Clone)]
pub struct AssetManifest {
    shell: String,
    urls: Vec<String>,
}

impl AssetManifest {
    /// Build a manifest from a shell URL and the remaining resource list.
    /// The shell is always part of the cached set; duplicates are dropped
    /// while preserving first-seen order.
    pub fn new(shell: impl Into<String>, urls: impl IntoIterator<Item = String>) -> Self {
        let shell = shell.into();
        let mut all = vec![shell.clone()];
        for url in urls {
            if !all.contains(&url) {
                all.push(url);
            }
        }
        Self { shell, urls: all }
    }

    /// The shell asset set for this application: root document, metadata,
    /// third-party stylesheets/scripts/fonts, the app's own modules, and
    /// placeholder icons. Backend SDK scripts are listed for initial caching;
    /// the interceptor excludes their API endpoints at runtime.
    pub fn standard(origin: &str) -> Self {
        let own = |path: &str| format!("{}{}", origin.trim_end_matches('/'), path);
        Self::new(
            own("/index.html"),
            [
                own("/"),
                own("/manifest.json"),
                "https://cdn.tailwindcss.com".to_string(),
                "https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600;700&display=swap"
                    .to_string(),
                "https://cdn.jsdelivr.net/npm/chart.js".to_string(),
                "https://cdnjs.cloudflare.com/ajax/libs/jszip/3.10.1/jszip.min.js".to_string(),
                "https://www.gstatic.com/firebasejs/8.10.1/firebase-app.js".to_string(),
                "https://www.gstatic.com/firebasejs/8.10.1/firebase-auth.js".to_string(),
                "https://www.gstatic.com/firebasejs/8.10.1/firebase-firestore.js".to_string(),
                own("/js/app-core.js"),
                own("/js/app-charts.js"),
                own("/js/app-ui.js"),
                own("/icons/icon-192.png"),
                own("/icons/icon-512.png"),
            ],
        )
    }

    pub fn shell_url(&self) -> &str {
        &self.shell
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_is_first_and_deduplicated() {
        let manifest = AssetManifest::new(
            "/index.html",
            vec![
                "/app.js".to_string(),
                "/index.html".to_string(),
                "/app.js".to_string(),
            ],
        );
        assert_eq!(manifest.urls(), &["/index.html", "/app.js"]);
        assert_eq!(manifest.shell_url(), "/index.html");
    }

    #[test]
    fn test_standard_manifest_includes_shell_and_icons() {
        let manifest = AssetManifest::standard("https://tracker.local");
        assert_eq!(manifest.shell_url(), "https://tracker.local/index.html");
        assert!(manifest
            .urls()
            .iter()
            .any(|u| u == "https://tracker.local/icons/icon-512.png"));
        assert!(manifest.urls().iter().any(|u| u.contains("fonts.googleapis.com")));
    }
}

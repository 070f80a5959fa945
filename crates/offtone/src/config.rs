use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use url::Url;

use crate::error::ProxyError;
use crate::store::StoreKind;

const DEFAULT_USER_AGENT: &str = "offtone/0.2";

/// Configurable options for the caching proxy
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Origin server every relative request identity is resolved against
    pub base_url: Url,

    /// Prefix shared by all store names (the "application" part of a store name)
    pub store_prefix: String,

    /// Version suffix baked into every store name; bumping it makes activation
    /// garbage-collect the previous generation of stores
    pub store_version: u32,

    /// Path prefix identifying generic API requests
    pub api_prefix: String,

    /// Shell assets precached during install (paths relative to `base_url`)
    pub shell_assets: Vec<String>,

    /// Overall timeout for the entire HTTP request (zero disables)
    pub timeout: Duration,

    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    /// User agent string
    pub user_agent: String,

    /// Custom HTTP headers sent with every outbound request
    pub headers: HeaderMap,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://localhost:8000/")
                .expect("default base URL must be valid"),
            store_prefix: "offtone".to_string(),
            store_version: 1,
            api_prefix: "/api/".to_string(),
            shell_assets: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/manifest.json".to_string(),
                "/favicon.ico".to_string(),
                "/static/js/main.js".to_string(),
                "/static/css/main.css".to_string(),
            ],
            timeout: Duration::from_secs(0),
            connect_timeout: Duration::from_secs(10),
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: ProxyConfig::get_default_headers(),
        }
    }
}

impl ProxyConfig {
    pub fn builder() -> crate::builder::ProxyConfigBuilder {
        crate::builder::ProxyConfigBuilder::new()
    }

    /// Concrete (versioned) name of one store partition
    pub fn store_name(&self, kind: StoreKind) -> String {
        format!("{}-{}-v{}", self.store_prefix, kind.slug(), self.store_version)
    }

    /// The full set of store names the current version keeps alive
    pub fn live_store_names(&self) -> Vec<String> {
        StoreKind::ALL
            .iter()
            .map(|kind| self.store_name(*kind))
            .collect()
    }

    /// Resolve a possibly-relative URL against the configured origin
    pub fn resolve(&self, url: &str) -> Result<Url, ProxyError> {
        self.base_url.join(url).map_err(ProxyError::from)
    }

    /// Metadata endpoint for one playlist, items included
    pub fn playlist_metadata_url(&self, playlist_id: &str) -> Result<Url, ProxyError> {
        let path = format!(
            "{}playlist/{}/?include_items=true",
            self.api_prefix, playlist_id
        );
        self.resolve(&path)
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut default_headers = HeaderMap::new();

        default_headers.insert(
            reqwest::header::ACCEPT_ENCODING,
            HeaderValue::from_static("gzip, deflate, br"),
        );

        default_headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static("*/*"));

        default_headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreKind;

    #[test]
    fn test_store_names_are_versioned() {
        let config = ProxyConfig::default();
        assert_eq!(config.store_name(StoreKind::Audio), "offtone-audio-v1");

        let names = config.live_store_names();
        assert_eq!(names.len(), 4);
        assert!(names.iter().all(|n| n.ends_with("-v1")));
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let config = ProxyConfig::default();

        let relative = config.resolve("/api/audio/5/download").unwrap();
        assert_eq!(relative.as_str(), "http://localhost:8000/api/audio/5/download");

        let absolute = config.resolve("https://cdn.example.com/a.mp3").unwrap();
        assert_eq!(absolute.as_str(), "https://cdn.example.com/a.mp3");
    }

    #[test]
    fn test_playlist_metadata_url() {
        let config = ProxyConfig::default();
        let url = config.playlist_metadata_url("42").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/playlist/42/?include_items=true"
        );
    }
}

//! # Builder for ProxyConfig
//!
//! This module provides a builder pattern implementation for creating and
//! customizing ProxyConfig instances with a fluent API.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use offtone_engine::ProxyConfig;
//!
//! let config = ProxyConfig::builder()
//!     .with_base_url("https://media.example.com")
//!     .unwrap()
//!     .with_store_version(2)
//!     .with_timeout(Duration::from_secs(60))
//!     .with_shell_asset("/offline.html")
//!     .build();
//! ```

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

use crate::ProxyConfig;
use crate::error::ProxyError;

/// Builder for creating ProxyConfig instances with a fluent API
#[derive(Debug, Clone)]
pub struct ProxyConfigBuilder {
    /// Internal config being built
    config: ProxyConfig,
}

impl ProxyConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ProxyConfig::default(),
        }
    }

    /// Set the origin server all relative requests resolve against
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Result<Self, ProxyError> {
        self.config.base_url = url::Url::parse(base_url.as_ref())?;
        Ok(self)
    }

    /// Set the prefix shared by all store names
    pub fn with_store_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.store_prefix = prefix.into();
        self
    }

    /// Set the store version suffix; bumping it garbage-collects the previous
    /// generation of stores on activation
    pub fn with_store_version(mut self, version: u32) -> Self {
        self.config.store_version = version;
        self
    }

    /// Set the path prefix identifying generic API requests
    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.api_prefix = prefix.into();
        self
    }

    /// Replace the shell asset list precached at install time
    pub fn with_shell_assets(mut self, assets: Vec<String>) -> Self {
        self.config.shell_assets = assets;
        self
    }

    /// Add one shell asset to the install-time precache list
    pub fn with_shell_asset(mut self, asset: impl Into<String>) -> Self {
        self.config.shell_assets.push(asset.into());
        self
    }

    /// Set the overall timeout for the entire HTTP request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout (time to establish initial connection)
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set whether to follow redirects
    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.config.follow_redirects = follow;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add a custom HTTP header
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.as_ref().parse::<reqwest::header::HeaderName>(),
            HeaderValue::from_str(value.as_ref()),
        ) {
            self.config.headers.insert(name, value);
        }
        self
    }

    /// Set all HTTP headers, replacing any existing headers
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.config.headers = headers;
        self
    }

    /// Build the ProxyConfig instance
    pub fn build(self) -> ProxyConfig {
        self.config
    }
}

impl Default for ProxyConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_builder_defaults() {
        let config = ProxyConfigBuilder::new().build();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.follow_redirects);
        assert_eq!(config.store_version, 1);
        assert_eq!(config.api_prefix, "/api/");
        assert!(!config.shell_assets.is_empty());
    }

    #[test]
    fn test_builder_customization() {
        let config = ProxyConfigBuilder::new()
            .with_base_url("https://media.example.com")
            .unwrap()
            .with_store_prefix("player")
            .with_store_version(3)
            .with_timeout(Duration::from_secs(60))
            .with_follow_redirects(false)
            .with_user_agent("CustomAgent/1.0")
            .with_header("X-Custom-Header", "CustomValue")
            .build();

        assert_eq!(config.base_url.as_str(), "https://media.example.com/");
        assert_eq!(config.store_name(crate::store::StoreKind::Api), "player-api-v3");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(!config.follow_redirects);
        assert_eq!(config.user_agent, "CustomAgent/1.0");

        let header_value = config.headers.get("X-Custom-Header").unwrap();
        assert_eq!(header_value.to_str().unwrap(), "CustomValue");
    }

    #[test]
    fn test_builder_rejects_invalid_base_url() {
        assert!(ProxyConfigBuilder::new().with_base_url("not a url").is_err());
    }

    #[test]
    fn test_shell_asset_append() {
        let default_len = ProxyConfig::default().shell_assets.len();
        let config = ProxyConfigBuilder::new()
            .with_shell_asset("/offline.html")
            .build();
        assert_eq!(config.shell_assets.len(), default_len + 1);
        assert_eq!(config.shell_assets.last().unwrap(), "/offline.html");
    }
}

//! # Caching Proxy
//!
//! The bootstrap wiring: stores, router, strategies, lifecycle, and control
//! channel are instantiated once here and shared by reference. `handle` is
//! the single entry point for intercepted requests.

use std::sync::Arc;

use tracing::debug;

use crate::ProxyConfig;
use crate::control::{ControlChannel, ControlContext};
use crate::error::ProxyError;
use crate::fetch::{Fetch, HttpFetcher};
use crate::lifecycle::LifecycleManager;
use crate::request::ProxyRequest;
use crate::response::ProxyResponse;
use crate::router::{Policy, Router};
use crate::store::{StoreKind, StoreManager};
use crate::strategy::{
    CacheFirst, CacheFirstAudioFallback, NetworkFirst, StaleWhileRevalidate, Strategy,
};

pub struct CachingProxy {
    config: Arc<ProxyConfig>,
    stores: Arc<StoreManager>,
    fetcher: Arc<dyn Fetch>,
    router: Router,
    lifecycle: Arc<LifecycleManager>,
    network_first: Arc<NetworkFirst>,
    cache_first: Arc<CacheFirst>,
    audio_fallback: Arc<CacheFirstAudioFallback>,
    stale_while_revalidate: Arc<StaleWhileRevalidate>,
}

impl CachingProxy {
    /// Create a proxy backed by a real HTTP client
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        let fetcher = Arc::new(HttpFetcher::new(&config)?);
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Create a proxy with an explicit network seam (tests, instrumentation)
    pub fn with_fetcher(config: ProxyConfig, fetcher: Arc<dyn Fetch>) -> Self {
        let config = Arc::new(config);
        let stores = Arc::new(StoreManager::new());
        let router = Router::standard(&config);
        let lifecycle = Arc::new(LifecycleManager::new(
            config.clone(),
            stores.clone(),
            fetcher.clone(),
        ));

        let shell_root = config
            .resolve("/")
            .map(|url| url.to_string())
            .unwrap_or_else(|_| "/".to_string());

        Self {
            config,
            stores,
            fetcher,
            router,
            lifecycle,
            network_first: Arc::new(NetworkFirst::new().with_shell_fallback(shell_root)),
            cache_first: Arc::new(CacheFirst),
            audio_fallback: Arc::new(CacheFirstAudioFallback),
            stale_while_revalidate: Arc::new(StaleWhileRevalidate),
        }
    }

    /// Install and immediately activate this proxy version
    pub async fn start(&self) -> Result<(), ProxyError> {
        self.lifecycle.install().await?;
        self.lifecycle.activate().await
    }

    /// Resolve one intercepted request.
    ///
    /// Non-http(s) and non-GET requests pass straight to the network and
    /// never touch a store.
    pub async fn handle(&self, request: ProxyRequest) -> Result<ProxyResponse, ProxyError> {
        if !request.is_http() || !request.is_get() {
            return self.fetcher.fetch(&request).await;
        }

        let route = self.router.classify(&request);
        debug!(url = %request.url, route = route.name, "dispatching request");

        let store = self.stores.open(&self.config.store_name(route.store));
        self.strategy(route.policy)
            .handle(&request, store, self.fetcher.clone())
            .await
    }

    fn strategy(&self, policy: Policy) -> Arc<dyn Strategy> {
        match policy {
            Policy::NetworkFirst => self.network_first.clone(),
            Policy::CacheFirst => self.cache_first.clone(),
            Policy::CacheFirstAudioFallback => self.audio_fallback.clone(),
            Policy::StaleWhileRevalidate => self.stale_while_revalidate.clone(),
        }
    }

    /// Whether a URL is already available offline, using the same tolerant
    /// matching the audio strategy applies
    pub async fn is_cached(&self, url: &str) -> Result<bool, ProxyError> {
        let resolved = self.config.resolve(url)?;

        let audio = self.stores.open(&self.config.store_name(StoreKind::Audio));
        let path = resolved.path().to_string();
        let with_slash = if path.ends_with('/') {
            path.clone()
        } else {
            format!("{path}/")
        };
        let without_slash = path.trim_end_matches('/').to_string();
        for key in [resolved.as_str(), &path, &with_slash, &without_slash] {
            if audio.contains(key).await? {
                return Ok(true);
            }
        }

        for kind in [StoreKind::Shell, StoreKind::Api, StoreKind::Image] {
            let store = self.stores.open(&self.config.store_name(kind));
            if store.contains(resolved.as_str()).await? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Spawn the control channel dispatcher for this proxy
    pub fn control_channel(&self) -> ControlChannel {
        ControlChannel::spawn(
            ControlContext {
                config: self.config.clone(),
                stores: self.stores.clone(),
                fetcher: self.fetcher.clone(),
                lifecycle: self.lifecycle.clone(),
            },
            32,
        )
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn stores(&self) -> &Arc<StoreManager> {
        &self.stores
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }
}

//! # Network-First Strategy
//!
//! Prefer the network, persist successful GETs, and fall back to the store
//! when the network is unreachable. Navigations degrade one step further, to
//! the cached application shell.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ProxyError;
use crate::fetch::Fetch;
use crate::request::ProxyRequest;
use crate::response::ProxyResponse;
use crate::store::StoreBackend;
use crate::strategy::{Strategy, should_persist};

pub struct NetworkFirst {
    /// Store key of the shell document served to offline navigations
    shell_fallback_key: Option<String>,
}

impl NetworkFirst {
    pub fn new() -> Self {
        Self {
            shell_fallback_key: None,
        }
    }

    /// Serve this shell store entry to navigations when both network and
    /// exact match fail
    pub fn with_shell_fallback(mut self, key: impl Into<String>) -> Self {
        self.shell_fallback_key = Some(key.into());
        self
    }
}

impl Default for NetworkFirst {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Strategy for NetworkFirst {
    fn name(&self) -> &'static str {
        "network-first"
    }

    async fn handle(
        &self,
        request: &ProxyRequest,
        store: Arc<dyn StoreBackend>,
        fetcher: Arc<dyn Fetch>,
    ) -> Result<ProxyResponse, ProxyError> {
        let error = match fetcher.fetch(request).await {
            Ok(response) => {
                if should_persist(request, &response) {
                    // The network response is the result either way
                    if let Err(error) = store.put(request.exact_key(), response.clone()).await {
                        warn!(url = %request.url, %error, "failed to persist response");
                    }
                }
                return Ok(response);
            }
            Err(error) => error,
        };

        warn!(url = %request.url, %error, "network-first fetch failed, trying store");

        if request.is_get() {
            if let Some(hit) = store.get(&request.exact_key()).await? {
                debug!(url = %request.url, "served from store after network failure");
                return Ok(hit);
            }
        }

        if request.is_navigation() {
            if let Some(key) = &self.shell_fallback_key {
                if let Some(shell) = store.get(key).await? {
                    debug!(url = %request.url, "offline navigation served the cached shell");
                    return Ok(shell);
                }
            }
        }

        Err(error)
    }
}

//! # Strategies
//!
//! One implementation per caching policy. A strategy receives the request,
//! its target store, and the network seam, and resolves to a response; which
//! failures propagate and which are absorbed is the defining difference
//! between the policies.

pub mod audio_fallback;
pub mod cache_first;
pub mod network_first;
pub mod stale_while_revalidate;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;

pub use audio_fallback::CacheFirstAudioFallback;
pub use cache_first::CacheFirst;
pub use network_first::NetworkFirst;
pub use stale_while_revalidate::StaleWhileRevalidate;

use crate::error::ProxyError;
use crate::fetch::Fetch;
use crate::request::ProxyRequest;
use crate::response::ProxyResponse;
use crate::store::StoreBackend;

/// A caching policy
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Resolve the request against the store and/or the network
    async fn handle(
        &self,
        request: &ProxyRequest,
        store: Arc<dyn StoreBackend>,
        fetcher: Arc<dyn Fetch>,
    ) -> Result<ProxyResponse, ProxyError>;
}

/// Only successful GET responses are ever written by a strategy
pub(crate) fn should_persist(request: &ProxyRequest, response: &ProxyResponse) -> bool {
    request.is_get() && response.status == StatusCode::OK
}

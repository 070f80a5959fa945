//! # Cache-First Strategy
//!
//! Serve from the store when possible, otherwise fetch and persist. Network
//! failures propagate to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ProxyError;
use crate::fetch::Fetch;
use crate::request::ProxyRequest;
use crate::response::ProxyResponse;
use crate::store::StoreBackend;
use crate::strategy::{Strategy, should_persist};

pub struct CacheFirst;

#[async_trait]
impl Strategy for CacheFirst {
    fn name(&self) -> &'static str {
        "cache-first"
    }

    async fn handle(
        &self,
        request: &ProxyRequest,
        store: Arc<dyn StoreBackend>,
        fetcher: Arc<dyn Fetch>,
    ) -> Result<ProxyResponse, ProxyError> {
        if request.is_get() {
            if let Some(hit) = store.get(&request.exact_key()).await? {
                debug!(url = %request.url, "cache-first hit");
                return Ok(hit);
            }
        }

        let response = fetcher.fetch(request).await?;
        if should_persist(request, &response) {
            if let Err(error) = store.put(request.exact_key(), response.clone()).await {
                warn!(url = %request.url, %error, "failed to persist response");
            }
        }

        // Returned regardless of status; only transport failures propagate
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::test_utils::MockFetcher;

    #[tokio::test]
    async fn test_hit_short_circuits_network() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = Arc::new(MockFetcher::new());
        store
            .put("http://o.test/covers/1.webp".to_string(), ProxyResponse::ok("img"))
            .await
            .unwrap();

        let request = ProxyRequest::parse("http://o.test/covers/1.webp").unwrap();
        let response = CacheFirst
            .handle(&request, store, fetcher.clone())
            .await
            .unwrap();

        assert_eq!(response.body.as_ref(), b"img");
        assert_eq!(fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn test_miss_fetches_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("http://o.test/covers/1.webp", ProxyResponse::ok("img"));

        let request = ProxyRequest::parse("http://o.test/covers/1.webp").unwrap();
        CacheFirst
            .handle(&request, store.clone(), fetcher.clone())
            .await
            .unwrap();

        assert!(store.contains("http://o.test/covers/1.webp").await.unwrap());

        // Second pass is served from the store
        CacheFirst
            .handle(&request, store, fetcher.clone())
            .await
            .unwrap();
        assert_eq!(fetcher.request_count(), 1);
    }

    #[tokio::test]
    async fn test_store_write_failure_still_returns_response() {
        crate::init_test_tracing!();
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("http://o.test/covers/1.webp", ProxyResponse::ok("img"));

        let request = ProxyRequest::parse("http://o.test/covers/1.webp").unwrap();
        let response = CacheFirst
            .handle(&request, Arc::new(crate::test_utils::FailingStore), fetcher)
            .await
            .unwrap();

        assert_eq!(response.body.as_ref(), b"img");
    }

    #[tokio::test]
    async fn test_network_failure_propagates() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.set_offline(true);

        let request = ProxyRequest::parse("http://o.test/covers/1.webp").unwrap();
        let result = CacheFirst.handle(&request, store, fetcher).await;

        assert!(matches!(result, Err(ProxyError::Network(_))));
    }
}

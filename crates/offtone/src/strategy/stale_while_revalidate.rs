//! # Stale-While-Revalidate Strategy
//!
//! Serve the cached value immediately and refresh it in a background task.
//! The only visible network failure is the no-cache/no-network case.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ProxyError;
use crate::fetch::Fetch;
use crate::request::ProxyRequest;
use crate::response::ProxyResponse;
use crate::store::StoreBackend;
use crate::strategy::{Strategy, should_persist};

pub struct StaleWhileRevalidate;

impl StaleWhileRevalidate {
    /// Fetch and persist without blocking the caller; failures are logged
    /// only
    fn revalidate(request: ProxyRequest, store: Arc<dyn StoreBackend>, fetcher: Arc<dyn Fetch>) {
        tokio::spawn(async move {
            match fetcher.fetch(&request).await {
                Ok(response) if should_persist(&request, &response) => {
                    if let Err(error) = store.put(request.exact_key(), response).await {
                        warn!(url = %request.url, %error, "revalidation persist failed");
                    } else {
                        debug!(url = %request.url, "background revalidation refreshed entry");
                    }
                }
                Ok(response) => {
                    debug!(url = %request.url, status = %response.status, "revalidation response not persisted");
                }
                Err(error) => {
                    debug!(url = %request.url, %error, "background revalidation failed");
                }
            }
        });
    }
}

#[async_trait]
impl Strategy for StaleWhileRevalidate {
    fn name(&self) -> &'static str {
        "stale-while-revalidate"
    }

    async fn handle(
        &self,
        request: &ProxyRequest,
        store: Arc<dyn StoreBackend>,
        fetcher: Arc<dyn Fetch>,
    ) -> Result<ProxyResponse, ProxyError> {
        if request.is_get() {
            if let Some(hit) = store.get(&request.exact_key()).await? {
                Self::revalidate(request.clone(), store, fetcher);
                return Ok(hit);
            }
        }

        // No cached value: the network result, success or failure, is the
        // caller's result
        let response = fetcher.fetch(request).await?;
        if should_persist(request, &response) {
            if let Err(error) = store.put(request.exact_key(), response.clone()).await {
                warn!(url = %request.url, %error, "failed to persist response");
            }
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::test_utils::MockFetcher;
    use std::time::Duration;

    fn deps() -> (Arc<MemoryStore>, Arc<MockFetcher>) {
        (Arc::new(MemoryStore::new()), Arc::new(MockFetcher::new()))
    }

    #[tokio::test]
    async fn test_hit_returns_cached_and_revalidates() {
        let (store, fetcher) = deps();
        store
            .put("http://o.test/static/js/main.js".to_string(), ProxyResponse::ok("old"))
            .await
            .unwrap();
        fetcher.respond("http://o.test/static/js/main.js", ProxyResponse::ok("new"));

        let request = ProxyRequest::parse("http://o.test/static/js/main.js").unwrap();
        let response = StaleWhileRevalidate
            .handle(&request, store.clone(), fetcher.clone())
            .await
            .unwrap();

        // Stale value is returned immediately
        assert_eq!(response.body.as_ref(), b"old");

        // The background refresh lands shortly after
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if fetcher.request_count() > 0 {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        let refreshed = store
            .get("http://o.test/static/js/main.js")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(refreshed.body.as_ref(), b"new");
    }

    #[tokio::test]
    async fn test_hit_swallows_revalidation_failure() {
        let (store, fetcher) = deps();
        store
            .put("http://o.test/static/js/main.js".to_string(), ProxyResponse::ok("old"))
            .await
            .unwrap();
        fetcher.set_offline(true);

        let request = ProxyRequest::parse("http://o.test/static/js/main.js").unwrap();
        let response = StaleWhileRevalidate
            .handle(&request, store.clone(), fetcher)
            .await
            .unwrap();

        assert_eq!(response.body.as_ref(), b"old");
        tokio::time::sleep(Duration::from_millis(50)).await;
        let kept = store
            .get("http://o.test/static/js/main.js")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.body.as_ref(), b"old", "stale entry survives a failed refresh");
    }

    #[tokio::test]
    async fn test_miss_uses_network_and_persists() {
        let (store, fetcher) = deps();
        fetcher.respond("http://o.test/static/js/main.js", ProxyResponse::ok("fresh"));

        let request = ProxyRequest::parse("http://o.test/static/js/main.js").unwrap();
        let response = StaleWhileRevalidate
            .handle(&request, store.clone(), fetcher)
            .await
            .unwrap();

        assert_eq!(response.body.as_ref(), b"fresh");
        assert!(store.contains("http://o.test/static/js/main.js").await.unwrap());
    }

    #[tokio::test]
    async fn test_miss_store_write_failure_still_returns_response() {
        crate::init_test_tracing!();
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("http://o.test/static/js/main.js", ProxyResponse::ok("fresh"));

        let request = ProxyRequest::parse("http://o.test/static/js/main.js").unwrap();
        let response = StaleWhileRevalidate
            .handle(&request, Arc::new(crate::test_utils::FailingStore), fetcher)
            .await
            .unwrap();

        assert_eq!(response.body.as_ref(), b"fresh");
    }

    #[tokio::test]
    async fn test_miss_offline_propagates() {
        let (store, fetcher) = deps();
        fetcher.set_offline(true);

        let request = ProxyRequest::parse("http://o.test/static/js/main.js").unwrap();
        let result = StaleWhileRevalidate.handle(&request, store, fetcher).await;

        assert!(matches!(result, Err(ProxyError::Network(_))));
    }
}

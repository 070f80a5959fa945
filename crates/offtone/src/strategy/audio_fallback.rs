//! # Cache-First Audio Fallback Strategy
//!
//! Audio is requested with and without trailing slashes and query parameters,
//! so lookups try four key variants before touching the network. Failures are
//! never propagated: the player always receives a well-formed response, at
//! worst a synthesized 503 placeholder.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ProxyError;
use crate::fetch::Fetch;
use crate::request::ProxyRequest;
use crate::response::ProxyResponse;
use crate::store::StoreBackend;
use crate::strategy::Strategy;

pub struct CacheFirstAudioFallback;

impl CacheFirstAudioFallback {
    /// Lookup key variants, in match priority order: exact URL, bare path,
    /// path with an enforced trailing slash, path with the trailing slash
    /// stripped
    fn candidate_keys(request: &ProxyRequest) -> Vec<String> {
        let exact = request.exact_key();
        let path = request.path_key();
        let with_slash = if path.ends_with('/') {
            path.clone()
        } else {
            format!("{path}/")
        };
        let without_slash = path.trim_end_matches('/').to_string();

        let mut keys = vec![exact, path, with_slash, without_slash];
        keys.dedup();
        keys
    }
}

#[async_trait]
impl Strategy for CacheFirstAudioFallback {
    fn name(&self) -> &'static str {
        "cache-first-audio-fallback"
    }

    async fn handle(
        &self,
        request: &ProxyRequest,
        store: Arc<dyn StoreBackend>,
        fetcher: Arc<dyn Fetch>,
    ) -> Result<ProxyResponse, ProxyError> {
        if request.is_get() {
            for key in Self::candidate_keys(request) {
                match store.get(&key).await {
                    Ok(Some(hit)) => {
                        debug!(url = %request.url, key = %key, "audio served from store");
                        return Ok(hit);
                    }
                    Ok(None) => {}
                    Err(error) => {
                        warn!(url = %request.url, key = %key, %error, "audio store lookup failed");
                    }
                }
            }
        }

        match fetcher.fetch(request).await {
            Ok(response) if response.is_success() => {
                // Persisted under the bare path so every later variant lookup
                // resolves to this one entry
                if let Err(error) = store.put(request.path_key(), response.clone()).await {
                    warn!(url = %request.url, %error, "failed to persist audio");
                }
                Ok(response)
            }
            Ok(response) => {
                warn!(url = %request.url, status = %response.status, "audio fetch rejected, serving placeholder");
                Ok(ProxyResponse::offline_audio_placeholder())
            }
            Err(error) => {
                warn!(url = %request.url, %error, "audio fetch failed, serving placeholder");
                Ok(ProxyResponse::offline_audio_placeholder())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::test_utils::MockFetcher;
    use reqwest::StatusCode;

    fn deps() -> (Arc<MemoryStore>, Arc<MockFetcher>) {
        (Arc::new(MemoryStore::new()), Arc::new(MockFetcher::new()))
    }

    fn request(url: &str) -> ProxyRequest {
        ProxyRequest::parse(url).unwrap()
    }

    #[tokio::test]
    async fn test_exact_match_short_circuits_network() {
        let (store, fetcher) = deps();
        store
            .put(
                "http://o.test/api/audio/5/download?s=1".to_string(),
                ProxyResponse::ok("audio"),
            )
            .await
            .unwrap();

        let response = CacheFirstAudioFallback
            .handle(
                &request("http://o.test/api/audio/5/download?s=1"),
                store,
                fetcher.clone(),
            )
            .await
            .unwrap();

        assert_eq!(response.body.as_ref(), b"audio");
        assert_eq!(fetcher.request_count(), 0, "network must not be invoked on a hit");
    }

    #[tokio::test]
    async fn test_path_match_ignores_query() {
        let (store, fetcher) = deps();
        store
            .put("/api/audio/5/download".to_string(), ProxyResponse::ok("audio"))
            .await
            .unwrap();

        let response = CacheFirstAudioFallback
            .handle(
                &request("http://o.test/api/audio/5/download?session=xyz"),
                store,
                fetcher.clone(),
            )
            .await
            .unwrap();

        assert_eq!(response.body.as_ref(), b"audio");
        assert_eq!(fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn test_trailing_slash_variants_match() {
        let (store, fetcher) = deps();
        store
            .put("/api/audio/5/download/".to_string(), ProxyResponse::ok("audio"))
            .await
            .unwrap();

        // Requested without the slash, stored with it
        let response = CacheFirstAudioFallback
            .handle(
                &request("http://o.test/api/audio/5/download"),
                store.clone(),
                fetcher.clone(),
            )
            .await
            .unwrap();
        assert_eq!(response.body.as_ref(), b"audio");

        // And the other way around
        let (store, fetcher) = deps();
        store
            .put("/api/audio/5/download".to_string(), ProxyResponse::ok("audio"))
            .await
            .unwrap();
        let response = CacheFirstAudioFallback
            .handle(
                &request("http://o.test/api/audio/5/download/"),
                store,
                fetcher.clone(),
            )
            .await
            .unwrap();
        assert_eq!(response.body.as_ref(), b"audio");
        assert_eq!(fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn test_miss_fetches_and_persists_under_bare_path() {
        let (store, fetcher) = deps();
        fetcher.respond(
            "http://o.test/api/audio/5/download?s=1",
            ProxyResponse::ok("audio"),
        );

        CacheFirstAudioFallback
            .handle(
                &request("http://o.test/api/audio/5/download?s=1"),
                store.clone(),
                fetcher,
            )
            .await
            .unwrap();

        assert!(store.contains("/api/audio/5/download").await.unwrap());
    }

    #[tokio::test]
    async fn test_offline_miss_synthesizes_placeholder() {
        let (store, fetcher) = deps();
        fetcher.set_offline(true);

        let response = CacheFirstAudioFallback
            .handle(&request("http://o.test/api/audio/5/download"), store, fetcher)
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["error"], "Audio not available offline");
    }

    #[tokio::test]
    async fn test_non_2xx_synthesizes_placeholder() {
        let (store, fetcher) = deps();
        fetcher.respond(
            "http://o.test/api/audio/5/download",
            ProxyResponse::with_status(StatusCode::FORBIDDEN),
        );

        let response = CacheFirstAudioFallback
            .handle(&request("http://o.test/api/audio/5/download"), store.clone(), fetcher)
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!store.contains("/api/audio/5/download").await.unwrap());
    }
}

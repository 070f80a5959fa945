//! # Bulk Playlist Cache Job
//!
//! The long-running pipeline behind `CACHE_PLAYLIST`: authenticate, fetch,
//! and store a playlist's metadata plus every audio item, strictly one item
//! at a time, streaming progress and finishing with exactly one completion
//! message whatever happens along the way.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::ProxyConfig;
use crate::control::messages::{ItemStatus, JobDetails, JobEvent};
use crate::error::ProxyError;
use crate::fetch::Fetch;
use crate::request::ProxyRequest;
use crate::store::{StoreBackend, StoreKind, StoreManager};

/// Item label used for the metadata step's progress events
const METADATA_ITEM: &str = "Playlist metadata";

pub(crate) struct PlaylistCacheJob {
    pub config: Arc<ProxyConfig>,
    pub stores: Arc<StoreManager>,
    pub fetcher: Arc<dyn Fetch>,
    pub playlist_id: String,
    pub audio_urls: Vec<String>,
    pub auth_token: Option<String>,
    pub events: mpsc::Sender<JobEvent>,
}

impl PlaylistCacheJob {
    /// Run the job to completion. The reply channel always receives exactly
    /// one completion message, even when the job fails unexpectedly.
    pub async fn run(self) {
        let completion = match self.execute().await {
            Ok(completion) => completion,
            Err(err) => {
                error!(playlist_id = %self.playlist_id, error = %err, "playlist cache job failed");
                JobEvent::failure(err.to_string())
            }
        };

        if self.events.send(completion).await.is_err() {
            debug!(playlist_id = %self.playlist_id, "job reply channel dropped before completion");
        }
    }

    async fn execute(&self) -> Result<JobEvent, ProxyError> {
        let Some(token) = self.auth_token.as_deref() else {
            warn!(playlist_id = %self.playlist_id, "playlist caching rejected, no auth token");
            return Ok(JobEvent::failure(ProxyError::MissingAuthToken.to_string()));
        };

        let total = self.audio_urls.len() + 1;
        let mut current = 0usize;
        let mut cached: Vec<String> = Vec::new();
        let mut failed: Vec<String> = Vec::new();

        let api_store = self.stores.open(&self.config.store_name(StoreKind::Api));
        let audio_store = self.stores.open(&self.config.store_name(StoreKind::Audio));

        let metadata_cached = self.cache_metadata(api_store.as_ref(), token).await;
        current += 1;
        self.emit(current, total, METADATA_ITEM, status_of(metadata_cached))
            .await;

        // Strictly sequential: one in-flight item bounds origin load and
        // keeps progress numbering deterministic
        for url in &self.audio_urls {
            let ok = self.cache_audio_item(audio_store.as_ref(), token, url).await;
            if ok {
                cached.push(url.clone());
            } else {
                failed.push(url.clone());
            }
            current += 1;
            self.emit(current, total, url, status_of(ok)).await;
        }

        info!(
            playlist_id = %self.playlist_id,
            cached = cached.len(),
            failed = failed.len(),
            metadata = metadata_cached,
            "playlist cache job finished"
        );

        Ok(JobEvent::Complete {
            success: !cached.is_empty(),
            metadata: metadata_cached,
            cached: cached.len(),
            failed: failed.len(),
            details: Some(JobDetails {
                playlist_id: self.playlist_id.clone(),
                cached,
                failed,
            }),
            error: None,
        })
    }

    /// Fetch and store the playlist metadata document. Failure is logged and
    /// reported through the `metadata` flag, never fatal.
    async fn cache_metadata(&self, store: &dyn StoreBackend, token: &str) -> bool {
        let url = match self.config.playlist_metadata_url(&self.playlist_id) {
            Ok(url) => url,
            Err(err) => {
                warn!(playlist_id = %self.playlist_id, error = %err, "invalid metadata URL");
                return false;
            }
        };

        let request = ProxyRequest::get(url.clone())
            .with_header(reqwest::header::AUTHORIZATION.as_str(), format!("Token {token}"));

        match self.fetcher.fetch(&request).await {
            Ok(response) if response.is_success() => {
                match store.put(url.to_string(), response).await {
                    Ok(()) => true,
                    Err(err) => {
                        warn!(url = %url, error = %err, "failed to persist playlist metadata");
                        false
                    }
                }
            }
            Ok(response) => {
                warn!(url = %url, status = %response.status, "playlist metadata fetch rejected");
                false
            }
            Err(err) => {
                warn!(url = %url, error = %err, "playlist metadata fetch failed");
                false
            }
        }
    }

    /// Fetch and store one audio item; any failure lands it on the failed
    /// list without aborting the loop
    async fn cache_audio_item(&self, store: &dyn StoreBackend, token: &str, url: &str) -> bool {
        let resolved = match self.config.resolve(url) {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!(url = %url, error = %err, "invalid audio URL");
                return false;
            }
        };

        let request = ProxyRequest::get(resolved.clone())
            .with_header(reqwest::header::AUTHORIZATION.as_str(), format!("Token {token}"));

        match self.fetcher.fetch(&request).await {
            Ok(response) if response.is_success() => {
                match store.put(resolved.to_string(), response).await {
                    Ok(()) => {
                        debug!(url = %url, "audio item cached");
                        true
                    }
                    Err(err) => {
                        warn!(url = %url, error = %err, "failed to persist audio item");
                        false
                    }
                }
            }
            Ok(response) => {
                warn!(url = %url, status = %response.status, "audio item fetch rejected");
                false
            }
            Err(err) => {
                warn!(url = %url, error = %err, "audio item fetch failed");
                false
            }
        }
    }

    /// Emit one progress event, strictly after the item's outcome is known
    async fn emit(&self, current: usize, total: usize, item: &str, status: ItemStatus) {
        let percent = ((current as f64 / total as f64) * 100.0).round() as u32;
        let event = JobEvent::Progress {
            current,
            total,
            percent,
            current_item: item.to_string(),
            status,
        };

        if self.events.send(event).await.is_err() {
            debug!(playlist_id = %self.playlist_id, "job reply channel dropped, progress discarded");
        }
    }
}

fn status_of(ok: bool) -> ItemStatus {
    if ok { ItemStatus::Cached } else { ItemStatus::Failed }
}

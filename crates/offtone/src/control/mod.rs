//! # Control Channel
//!
//! A message-based RPC surface accepting operational commands from the
//! application UI. Each command carries its own reply channel, so concurrent
//! invocations never interfere; commands are handled on spawned tasks and a
//! long bulk job does not block the dispatcher.

pub mod messages;
pub mod playlist;

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

pub use messages::{Command, CommandReply, ItemStatus, JobDetails, JobEvent};

use crate::ProxyConfig;
use crate::control::playlist::PlaylistCacheJob;
use crate::error::ProxyError;
use crate::fetch::Fetch;
use crate::lifecycle::LifecycleManager;
use crate::request::ProxyRequest;
use crate::store::{StoreKind, StoreManager};

/// Shared dependencies every command handler needs
#[derive(Clone)]
pub(crate) struct ControlContext {
    pub config: Arc<ProxyConfig>,
    pub stores: Arc<StoreManager>,
    pub fetcher: Arc<dyn Fetch>,
    pub lifecycle: Arc<LifecycleManager>,
}

/// Handle to the control channel dispatcher
#[derive(Clone)]
pub struct ControlChannel {
    tx: mpsc::Sender<Command>,
}

impl ControlChannel {
    pub(crate) fn spawn(ctx: ControlContext, buffer: usize) -> Self {
        let (tx, mut rx) = mpsc::channel(buffer);

        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    handle_command(ctx, command).await;
                });
            }
            debug!("control channel closed");
        });

        Self { tx }
    }

    /// Raw command sender, for callers managing their own reply channels
    pub fn sender(&self) -> mpsc::Sender<Command> {
        self.tx.clone()
    }

    pub async fn skip_waiting(&self) -> Result<(), ProxyError> {
        self.tx
            .send(Command::SkipWaiting)
            .await
            .map_err(|_| ProxyError::ChannelClosed)
    }

    pub async fn clear_cache(&self) -> Result<CommandReply, ProxyError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::ClearCache { reply })
            .await
            .map_err(|_| ProxyError::ChannelClosed)?;
        rx.await.map_err(|_| ProxyError::ChannelClosed)
    }

    pub async fn cache_audio(&self, url: impl Into<String>) -> Result<CommandReply, ProxyError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::CacheAudio {
                url: url.into(),
                reply,
            })
            .await
            .map_err(|_| ProxyError::ChannelClosed)?;
        rx.await.map_err(|_| ProxyError::ChannelClosed)
    }

    /// Start a bulk playlist job and return its event stream
    pub async fn cache_playlist(
        &self,
        playlist_id: impl Into<String>,
        audio_urls: Vec<String>,
        auth_token: Option<String>,
    ) -> Result<mpsc::Receiver<JobEvent>, ProxyError> {
        let (events, rx) = mpsc::channel(32);
        self.tx
            .send(Command::CachePlaylist {
                playlist_id: playlist_id.into(),
                audio_urls,
                auth_token,
                events,
            })
            .await
            .map_err(|_| ProxyError::ChannelClosed)?;
        Ok(rx)
    }

    pub async fn remove_playlist_cache(
        &self,
        playlist_id: impl Into<String>,
        audio_urls: Vec<String>,
    ) -> Result<CommandReply, ProxyError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::RemovePlaylistCache {
                playlist_id: playlist_id.into(),
                audio_urls,
                reply,
            })
            .await
            .map_err(|_| ProxyError::ChannelClosed)?;
        rx.await.map_err(|_| ProxyError::ChannelClosed)
    }
}

async fn handle_command(ctx: ControlContext, command: Command) {
    match command {
        Command::SkipWaiting => {
            if let Err(error) = ctx.lifecycle.skip_waiting().await {
                warn!(%error, "skip waiting failed");
            }
        }

        Command::ClearCache { reply } => {
            for name in ctx.config.live_store_names() {
                ctx.stores.delete(&name);
            }
            debug!("all stores cleared");
            send_reply(reply, CommandReply::ok());
        }

        Command::CacheAudio { url, reply } => {
            let outcome = cache_single_audio(&ctx, &url).await;
            send_reply(reply, outcome);
        }

        Command::CachePlaylist {
            playlist_id,
            audio_urls,
            auth_token,
            events,
        } => {
            PlaylistCacheJob {
                config: ctx.config,
                stores: ctx.stores,
                fetcher: ctx.fetcher,
                playlist_id,
                audio_urls,
                auth_token,
                events,
            }
            .run()
            .await;
        }

        Command::RemovePlaylistCache {
            playlist_id,
            audio_urls,
            reply,
        } => {
            let outcome = remove_playlist_cache(&ctx, &playlist_id, &audio_urls).await;
            send_reply(reply, outcome);
        }
    }
}

fn send_reply(reply: oneshot::Sender<CommandReply>, value: CommandReply) {
    if reply.send(value).is_err() {
        debug!("reply receiver dropped");
    }
}

/// Fetch one resource and persist it into the audio store
async fn cache_single_audio(ctx: &ControlContext, url: &str) -> CommandReply {
    let resolved = match ctx.config.resolve(url) {
        Ok(resolved) => resolved,
        Err(error) => return CommandReply::failure(error.to_string()),
    };

    let request = ProxyRequest::get(resolved.clone());
    let response = match ctx.fetcher.fetch(&request).await {
        Ok(response) if response.is_success() => response,
        Ok(response) => {
            return CommandReply::failure(format!("server returned {}", response.status));
        }
        Err(error) => return CommandReply::failure(error.to_string()),
    };

    let store = ctx.stores.open(&ctx.config.store_name(StoreKind::Audio));
    match store.put(resolved.to_string(), response).await {
        Ok(()) => CommandReply::ok(),
        Err(error) => CommandReply::failure(error.to_string()),
    }
}

/// Drop a playlist's metadata entry and every listed audio URL. No reference
/// counting: a URL shared with another cached playlist is removed regardless.
async fn remove_playlist_cache(
    ctx: &ControlContext,
    playlist_id: &str,
    audio_urls: &[String],
) -> CommandReply {
    let api_store = ctx.stores.open(&ctx.config.store_name(StoreKind::Api));
    let audio_store = ctx.stores.open(&ctx.config.store_name(StoreKind::Audio));

    let result: Result<(), ProxyError> = async {
        if let Ok(metadata_url) = ctx.config.playlist_metadata_url(playlist_id) {
            api_store.remove(metadata_url.as_str()).await?;
        }

        for url in audio_urls {
            let resolved = ctx.config.resolve(url)?;
            // Entries may exist under the full URL (bulk job, CACHE_AUDIO) or
            // the bare path (audio fallback strategy); drop both identities
            audio_store.remove(resolved.as_str()).await?;
            audio_store.remove(resolved.path()).await?;
        }
        Ok(())
    }
    .await;

    match result {
        Ok(()) => {
            debug!(playlist_id = %playlist_id, urls = audio_urls.len(), "playlist cache removed");
            CommandReply::ok()
        }
        Err(error) => CommandReply::failure(error.to_string()),
    }
}

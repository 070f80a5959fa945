//! # Lifecycle Manager
//!
//! Drives the install and activate transitions of one deployed proxy version.
//! Install precaches the application shell best-effort; activation
//! garbage-collects every store that does not belong to the current version
//! and immediately takes over all subscribed clients through a watch channel.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::ProxyConfig;
use crate::error::ProxyError;
use crate::fetch::Fetch;
use crate::request::ProxyRequest;
use crate::store::{StoreKind, StoreManager};

/// Lifecycle states of a proxy version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Installing,
    /// Installed, not yet controlling clients
    Waiting,
    Activating,
    Active,
}

pub struct LifecycleManager {
    config: Arc<ProxyConfig>,
    stores: Arc<StoreManager>,
    fetcher: Arc<dyn Fetch>,
    state_tx: watch::Sender<LifecycleState>,
}

impl LifecycleManager {
    pub fn new(
        config: Arc<ProxyConfig>,
        stores: Arc<StoreManager>,
        fetcher: Arc<dyn Fetch>,
    ) -> Self {
        let (state_tx, _) = watch::channel(LifecycleState::Installing);
        Self {
            config,
            stores,
            fetcher,
            state_tx,
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state_tx.borrow()
    }

    /// Observe state transitions; subscribers are the "open clients" taken
    /// over at activation
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state_tx.subscribe()
    }

    fn transition(&self, state: LifecycleState) {
        debug!(?state, "lifecycle transition");
        self.state_tx.send_replace(state);
    }

    /// Install this version: open the live stores and precache the shell.
    ///
    /// A single failed asset never aborts the install; each failure is logged
    /// and the rest of the list proceeds.
    pub async fn install(&self) -> Result<(), ProxyError> {
        self.transition(LifecycleState::Installing);

        for kind in StoreKind::ALL {
            self.stores.open(&self.config.store_name(kind));
        }

        let shell = self.stores.open(&self.config.store_name(StoreKind::Shell));
        for asset in &self.config.shell_assets {
            let url = match self.config.resolve(asset) {
                Ok(url) => url,
                Err(error) => {
                    warn!(asset = %asset, %error, "shell asset has an invalid URL, skipping");
                    continue;
                }
            };

            let request = ProxyRequest::get(url.clone());
            match self.fetcher.fetch(&request).await {
                Ok(response) if response.status == reqwest::StatusCode::OK => {
                    match shell.put(url.to_string(), response).await {
                        Ok(()) => debug!(asset = %asset, "shell asset precached"),
                        Err(error) => {
                            warn!(asset = %asset, %error, "shell asset precache write failed");
                        }
                    }
                }
                Ok(response) => {
                    warn!(asset = %asset, status = %response.status, "shell asset precache rejected");
                }
                Err(error) => {
                    warn!(asset = %asset, %error, "shell asset precache failed");
                }
            }
        }

        info!(version = self.config.store_version, "install complete");
        self.transition(LifecycleState::Waiting);
        Ok(())
    }

    /// Force this version out of the waiting phase and activate it
    pub async fn skip_waiting(&self) -> Result<(), ProxyError> {
        if self.state() == LifecycleState::Waiting {
            info!("skip waiting requested");
            self.activate().await?;
        }
        Ok(())
    }

    /// Activate this version: delete every store outside the live set, then
    /// take over all subscribed clients immediately
    pub async fn activate(&self) -> Result<(), ProxyError> {
        self.transition(LifecycleState::Activating);

        let live = self.config.live_store_names();
        for name in self.stores.names() {
            if !live.contains(&name) {
                info!(store = %name, "garbage-collecting stale store");
                self.stores.delete(&name);
            }
        }

        // Live stores exist even if install was skipped
        for kind in StoreKind::ALL {
            self.stores.open(&self.config.store_name(kind));
        }

        self.transition(LifecycleState::Active);
        info!(version = self.config.store_version, "activated, clients claimed");
        Ok(())
    }
}

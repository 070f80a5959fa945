//! # Memory Store
//!
//! This module provides an in-memory store implementation using Moka. The
//! cache is built without a capacity bound: entries live until explicitly
//! removed, cleared, or garbage-collected with their whole store at
//! activation.

use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::response::ProxyResponse;
use crate::store::provider::{StoreBackend, StoreResult};

/// Memory store implementation using Moka
#[derive(Clone)]
pub struct MemoryStore {
    entries: MokaCache<String, ProxyResponse>,
}

impl MemoryStore {
    /// Create a new, empty memory store
    pub fn new() -> Self {
        Self {
            entries: MokaCache::builder().build(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl StoreBackend for MemoryStore {
    async fn contains(&self, key: &str) -> StoreResult<bool> {
        Ok(self.entries.contains_key(key))
    }

    async fn get(&self, key: &str) -> StoreResult<Option<ProxyResponse>> {
        Ok(self.entries.get(key).await)
    }

    async fn put(&self, key: String, response: ProxyResponse) -> StoreResult<()> {
        debug!(key = %key, status = %response.status, size = response.body.len(), "store put");
        self.entries.insert(key, response).await;
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<bool> {
        let existed = self.entries.remove(key).await.is_some();
        if existed {
            debug!(key = %key, "store entry removed");
        }
        Ok(existed)
    }

    async fn clear(&self) -> StoreResult<()> {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks().await;
        debug!("store cleared");
        Ok(())
    }

    async fn len(&self) -> StoreResult<u64> {
        self.entries.run_pending_tasks().await;
        Ok(self.entries.entry_count())
    }
}

//! # Store Manager
//!
//! This module provides the manager owning every named store. Stores are
//! opened on demand (create-if-absent), enumerated and deleted by name during
//! activation garbage collection, and shared by reference with the strategies
//! and the control channel.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::store::memory::MemoryStore;
use crate::store::provider::{StoreBackend, StoreResult};

/// Factory producing a fresh backend when a store name is opened for the
/// first time
pub type BackendFactory = Box<dyn Fn() -> Arc<dyn StoreBackend> + Send + Sync>;

/// Manager owning the name → store map
pub struct StoreManager {
    stores: RwLock<HashMap<String, Arc<dyn StoreBackend>>>,
    factory: BackendFactory,
}

impl StoreManager {
    /// Create a manager backed by in-memory stores
    pub fn new() -> Self {
        Self::with_backend_factory(Box::new(|| Arc::new(MemoryStore::new())))
    }

    /// Create a manager with a custom backend factory
    pub fn with_backend_factory(factory: BackendFactory) -> Self {
        Self {
            stores: RwLock::new(HashMap::new()),
            factory,
        }
    }

    /// Open a store by name, creating it if absent
    pub fn open(&self, name: &str) -> Arc<dyn StoreBackend> {
        if let Some(store) = self.stores.read().get(name) {
            return store.clone();
        }

        let mut stores = self.stores.write();
        stores
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(store = name, "store opened");
                (self.factory)()
            })
            .clone()
    }

    /// Get a store by name without creating it
    pub fn get(&self, name: &str) -> Option<Arc<dyn StoreBackend>> {
        self.stores.read().get(name).cloned()
    }

    /// Delete a store and all its entries; returns whether it existed
    pub fn delete(&self, name: &str) -> bool {
        let removed = self.stores.write().remove(name).is_some();
        if removed {
            info!(store = name, "store deleted");
        }
        removed
    }

    /// Names of every currently open store
    pub fn names(&self) -> Vec<String> {
        self.stores.read().keys().cloned().collect()
    }

    /// Per-store entry counts, for "offline storage" reporting
    pub async fn stats(&self) -> StoreResult<Vec<(String, u64)>> {
        let stores: Vec<(String, Arc<dyn StoreBackend>)> = {
            let guard = self.stores.read();
            guard
                .iter()
                .map(|(name, store)| (name.clone(), store.clone()))
                .collect()
        };

        let mut stats = Vec::with_capacity(stores.len());
        for (name, store) in stores {
            stats.push((name, store.len().await?));
        }
        stats.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(stats)
    }
}

impl Default for StoreManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ProxyResponse;

    #[tokio::test]
    async fn test_open_is_create_if_absent() {
        let manager = StoreManager::new();
        let store = manager.open("offtone-audio-v1");
        store
            .put("/audio/1".to_string(), ProxyResponse::ok("bytes"))
            .await
            .unwrap();

        // Reopening yields the same store, entries intact
        let again = manager.open("offtone-audio-v1");
        assert!(again.get("/audio/1").await.unwrap().is_some());
        assert_eq!(manager.names().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_by_name() {
        let manager = StoreManager::new();
        manager.open("offtone-audio-v1");

        assert!(manager.delete("offtone-audio-v1"));
        assert!(!manager.delete("offtone-audio-v1"));
        assert!(manager.get("offtone-audio-v1").is_none());
    }

    #[tokio::test]
    async fn test_stats() {
        let manager = StoreManager::new();
        let audio = manager.open("audio");
        manager.open("api");
        audio
            .put("/a".to_string(), ProxyResponse::ok("x"))
            .await
            .unwrap();
        audio
            .put("/b".to_string(), ProxyResponse::ok("y"))
            .await
            .unwrap();

        let stats = manager.stats().await.unwrap();
        assert_eq!(stats, vec![("api".to_string(), 0), ("audio".to_string(), 2)]);
    }
}

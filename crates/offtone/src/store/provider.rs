//! # Store Backend
//!
//! This module defines the backend trait every store implementation must
//! follow. Entries map a canonical request identity to a buffered response;
//! there is no eviction policy, only explicit removal.

use async_trait::async_trait;

use crate::response::ProxyResponse;

/// Result of a store operation
pub type StoreResult<T> = std::result::Result<T, std::io::Error>;

/// A key-value store of request identity → response
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Check whether the store holds an entry for the given key
    async fn contains(&self, key: &str) -> StoreResult<bool>;

    /// Get an entry from the store
    async fn get(&self, key: &str) -> StoreResult<Option<ProxyResponse>>;

    /// Put an entry into the store, overwriting any previous value
    async fn put(&self, key: String, response: ProxyResponse) -> StoreResult<()>;

    /// Remove an entry; returns whether it existed
    async fn remove(&self, key: &str) -> StoreResult<bool>;

    /// Remove all entries
    async fn clear(&self) -> StoreResult<()>;

    /// Number of entries currently stored
    async fn len(&self) -> StoreResult<u64>;
}

//! # Stores
//!
//! Named key-value stores holding request identity → response entries. Each
//! partition covers one class of content; the manager owns the name → store
//! map and the lifecycle manager decides which names survive activation.

pub mod manager;
pub mod memory;
pub mod provider;

pub use manager::StoreManager;
pub use memory::MemoryStore;
pub use provider::{StoreBackend, StoreResult};

/// The fixed set of store partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    /// Application shell and other static assets
    Shell,
    /// API responses
    Api,
    /// Audio files
    Audio,
    /// Images
    Image,
}

impl StoreKind {
    pub const ALL: [StoreKind; 4] = [
        StoreKind::Shell,
        StoreKind::Api,
        StoreKind::Audio,
        StoreKind::Image,
    ];

    /// The partition's slug within a concrete store name
    pub fn slug(&self) -> &'static str {
        match self {
            StoreKind::Shell => "static",
            StoreKind::Api => "api",
            StoreKind::Audio => "audio",
            StoreKind::Image => "images",
        }
    }
}

//! # Offtone
//!
//! A client-side caching proxy for media library applications: every outbound
//! request is classified by an ordered rule table, dispatched to one of four
//! caching strategies against a named store partition, and an asynchronous
//! control channel runs bulk "make available offline" jobs with streamed
//! progress and partial-failure accounting.
//!
//! ## Features
//!
//! - First-match-wins request routing over configurable URL patterns
//! - Network-first, cache-first, audio-fallback and stale-while-revalidate
//!   policies
//! - Versioned store partitions with activation-time garbage collection
//! - Message-based control channel with per-invocation reply channels
//! - Sequential bulk playlist caching with progress reporting

pub mod builder;
pub mod config;
pub mod control;
pub mod error;
pub mod fetch;
pub mod lifecycle;
pub mod proxy;
pub mod request;
pub mod response;
pub mod router;
pub mod store;
pub mod strategy;
pub mod test_utils;

pub use builder::ProxyConfigBuilder;
pub use config::ProxyConfig;
pub use error::ProxyError;
pub use proxy::CachingProxy;

// Re-export the request/response surface
pub use request::{Destination, ProxyRequest};
pub use response::ProxyResponse;

// Re-export routing and strategy types
pub use router::{Policy, Route, Router};
pub use strategy::{
    CacheFirst, CacheFirstAudioFallback, NetworkFirst, StaleWhileRevalidate, Strategy,
};

// Re-export store types
pub use store::{MemoryStore, StoreBackend, StoreKind, StoreManager};

// Re-export lifecycle and control surfaces
pub use control::{Command, CommandReply, ControlChannel, ItemStatus, JobDetails, JobEvent};
pub use fetch::{Fetch, HttpFetcher, create_client};
pub use lifecycle::{LifecycleManager, LifecycleState};

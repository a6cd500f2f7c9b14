//! Cache Module
//!
//! Generic in-process caching with TTL expiration, LRU/FIFO/LFU eviction,
//! size-triggered compression and metrics.

pub mod compression;
mod engine;
mod entry;
pub mod eviction;
mod handle;
pub mod metrics;
mod pattern;


// Re-export public types
pub use engine::CacheEngine;
pub use entry::{current_timestamp_ms, CacheEntry, StoredValue};
pub use eviction::EvictionStrategy;
pub use handle::CacheHandle;
pub use metrics::{CacheInfo, CacheMetrics};
pub use pattern::KeyPattern;

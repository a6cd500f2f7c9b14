//! fincache - In-process caching for financial data
//!
//! A generic TTL cache with LRU/FIFO/LFU eviction, compression and metrics,
//! topped by a financial-domain facade with filter-based keys and cascading
//! invalidation.

pub mod api;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheEngine, CacheHandle, EvictionStrategy};
pub use config::{AppConfig, CacheConfig, CacheConfigUpdate};
pub use domain::{FinancialCache, TransactionFilters};
pub use error::{CacheError, Result};
pub use tasks::spawn_sweep_task;

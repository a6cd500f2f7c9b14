//! Domain Module
//!
//! Business-domain facades over the generic cache. Each facade owns one
//! cache handle and defines its own key namespace, TTL tiers and
//! invalidation cascades.

pub mod financial;
mod filters;

pub use financial::{CacheTier, FinancialCache, InvalidationTarget};
pub use filters::TransactionFilters;

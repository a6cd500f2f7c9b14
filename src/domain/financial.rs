//! Financial Cache Facade
//!
//! Owns one cache handle for financial data: named TTL tiers, namespaced
//! keys built from filters, and invalidation that cascades from master data
//! and transactions to the statistics and aggregations derived from them.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{CacheHandle, CacheInfo, CacheMetrics, KeyPattern};
use crate::config::CacheConfig;
use crate::domain::TransactionFilters;
use crate::error::{CacheError, Result};

// == Key Namespace ==
/// Key prefixes owned by the facade.
pub mod keys {
    pub const ROOT: &str = "financial:";
    pub const CATEGORIES: &str = "financial:categories";
    pub const BANK_ACCOUNTS: &str = "financial:bank_accounts";
    pub const PAYMENT_METHODS: &str = "financial:payment_methods";
    pub const REVENUES: &str = "financial:revenues";
    pub const EXPENSES: &str = "financial:expenses";
    pub const REVENUE: &str = "financial:revenue:";
    pub const EXPENSE: &str = "financial:expense:";
    pub const STATS: &str = "financial:stats";
    pub const AGGREGATIONS: &str = "financial:aggregations";
    pub const MONTHLY_AGGREGATION: &str = "financial:aggregations:monthly:";
    pub const CATEGORY_AGGREGATION: &str = "financial:aggregations:category";
}

// == TTL Tiers ==
/// Freshness class of cached financial data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    /// Categories, bank accounts, payment methods
    MasterData,
    /// Revenue and expense listings
    Transactions,
    /// Dashboard statistics
    Statistics,
    /// Single revenue/expense lookups
    Entity,
    /// Monthly and per-category totals
    Aggregation,
}

impl CacheTier {
    pub fn ttl(&self) -> Duration {
        match self {
            CacheTier::MasterData => Duration::from_secs(30 * 60),
            CacheTier::Transactions => Duration::from_secs(5 * 60),
            CacheTier::Statistics => Duration::from_secs(2 * 60),
            CacheTier::Entity => Duration::from_secs(10 * 60),
            CacheTier::Aggregation => Duration::from_secs(15 * 60),
        }
    }
}

// == Invalidation Target ==
/// Named invalidation entry points, as called by write paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationTarget {
    Categories,
    BankAccounts,
    PaymentMethods,
    Revenues,
    Expenses,
    Transactions,
    Stats,
    Aggregations,
    All,
}

impl fmt::Display for InvalidationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InvalidationTarget::Categories => "categories",
            InvalidationTarget::BankAccounts => "bank_accounts",
            InvalidationTarget::PaymentMethods => "payment_methods",
            InvalidationTarget::Revenues => "revenues",
            InvalidationTarget::Expenses => "expenses",
            InvalidationTarget::Transactions => "transactions",
            InvalidationTarget::Stats => "stats",
            InvalidationTarget::Aggregations => "aggregations",
            InvalidationTarget::All => "all",
        };
        f.write_str(name)
    }
}

impl FromStr for InvalidationTarget {
    type Err = CacheError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "categories" => Ok(InvalidationTarget::Categories),
            "bank_accounts" => Ok(InvalidationTarget::BankAccounts),
            "payment_methods" => Ok(InvalidationTarget::PaymentMethods),
            "revenues" => Ok(InvalidationTarget::Revenues),
            "expenses" => Ok(InvalidationTarget::Expenses),
            "transactions" => Ok(InvalidationTarget::Transactions),
            "stats" => Ok(InvalidationTarget::Stats),
            "aggregations" => Ok(InvalidationTarget::Aggregations),
            "all" => Ok(InvalidationTarget::All),
            other => Err(CacheError::NotFound(format!(
                "Unknown invalidation target '{}'",
                other
            ))),
        }
    }
}

// == Financial Cache ==
/// Domain cache for financial data.
///
/// Values are stored as JSON documents, so callers can cache any
/// serializable type and read it back as the same type.
#[derive(Clone)]
pub struct FinancialCache {
    cache: CacheHandle<Value>,
}

impl FinancialCache {
    /// Wraps an existing handle. The handle should not be shared with other
    /// facades, since `invalidate_all` clears the `financial:` namespace.
    pub fn new(cache: CacheHandle<Value>) -> Self {
        Self { cache }
    }

    pub fn with_config(config: CacheConfig) -> Result<Self> {
        Ok(Self::new(CacheHandle::new(config)?))
    }

    /// Underlying handle, for sweep scheduling and raw pattern invalidation.
    pub fn handle(&self) -> &CacheHandle<Value> {
        &self.cache
    }

    pub async fn metrics(&self) -> CacheMetrics {
        self.cache.metrics().await
    }

    pub async fn info(&self) -> CacheInfo {
        self.cache.info().await
    }

    // == Master Data ==

    pub async fn get_categories<V: DeserializeOwned>(&self, kind: Option<&str>) -> Option<V> {
        self.read(&categories_key(kind)).await
    }

    pub async fn set_categories<V: Serialize>(&self, kind: Option<&str>, value: &V) -> Result<()> {
        self.write(categories_key(kind), CacheTier::MasterData, value)
            .await
    }

    pub async fn get_bank_accounts<V: DeserializeOwned>(&self) -> Option<V> {
        self.read(keys::BANK_ACCOUNTS).await
    }

    pub async fn set_bank_accounts<V: Serialize>(&self, value: &V) -> Result<()> {
        self.write(keys::BANK_ACCOUNTS.to_string(), CacheTier::MasterData, value)
            .await
    }

    pub async fn get_payment_methods<V: DeserializeOwned>(&self) -> Option<V> {
        self.read(keys::PAYMENT_METHODS).await
    }

    pub async fn set_payment_methods<V: Serialize>(&self, value: &V) -> Result<()> {
        self.write(keys::PAYMENT_METHODS.to_string(), CacheTier::MasterData, value)
            .await
    }

    // == Transactions ==

    pub async fn get_revenues<V: DeserializeOwned>(&self, filters: &TransactionFilters) -> Option<V> {
        self.read(&filtered_key(keys::REVENUES, filters)).await
    }

    pub async fn set_revenues<V: Serialize>(&self, filters: &TransactionFilters, value: &V) -> Result<()> {
        self.write(
            filtered_key(keys::REVENUES, filters),
            CacheTier::Transactions,
            value,
        )
        .await
    }

    pub async fn get_expenses<V: DeserializeOwned>(&self, filters: &TransactionFilters) -> Option<V> {
        self.read(&filtered_key(keys::EXPENSES, filters)).await
    }

    pub async fn set_expenses<V: Serialize>(&self, filters: &TransactionFilters, value: &V) -> Result<()> {
        self.write(
            filtered_key(keys::EXPENSES, filters),
            CacheTier::Transactions,
            value,
        )
        .await
    }

    // == Single Entities ==

    pub async fn get_revenue<V: DeserializeOwned>(&self, id: &str) -> Option<V> {
        self.read(&entity_key(keys::REVENUE, id)).await
    }

    pub async fn set_revenue<V: Serialize>(&self, id: &str, value: &V) -> Result<()> {
        self.write(entity_key(keys::REVENUE, id), CacheTier::Entity, value)
            .await
    }

    pub async fn get_expense<V: DeserializeOwned>(&self, id: &str) -> Option<V> {
        self.read(&entity_key(keys::EXPENSE, id)).await
    }

    pub async fn set_expense<V: Serialize>(&self, id: &str, value: &V) -> Result<()> {
        self.write(entity_key(keys::EXPENSE, id), CacheTier::Entity, value)
            .await
    }

    // == Derived Data ==

    pub async fn get_stats<V: DeserializeOwned>(&self, filters: &TransactionFilters) -> Option<V> {
        self.read(&filtered_key(keys::STATS, filters)).await
    }

    pub async fn set_stats<V: Serialize>(&self, filters: &TransactionFilters, value: &V) -> Result<()> {
        self.write(
            filtered_key(keys::STATS, filters),
            CacheTier::Statistics,
            value,
        )
        .await
    }

    pub async fn get_monthly_aggregation<V: DeserializeOwned>(&self, year: i32, month: u32) -> Option<V> {
        self.read(&monthly_key(year, month)).await
    }

    pub async fn set_monthly_aggregation<V: Serialize>(&self, year: i32, month: u32, value: &V) -> Result<()> {
        self.write(monthly_key(year, month), CacheTier::Aggregation, value)
            .await
    }

    pub async fn get_category_aggregation<V: DeserializeOwned>(
        &self,
        filters: &TransactionFilters,
    ) -> Option<V> {
        self.read(&filtered_key(keys::CATEGORY_AGGREGATION, filters))
            .await
    }

    pub async fn set_category_aggregation<V: Serialize>(
        &self,
        filters: &TransactionFilters,
        value: &V,
    ) -> Result<()> {
        self.write(
            filtered_key(keys::CATEGORY_AGGREGATION, filters),
            CacheTier::Aggregation,
            value,
        )
        .await
    }

    // == Invalidation ==
    // Cascades only run from master data and transactions towards derived
    // tiers. Each method returns the number of entries removed.

    pub async fn invalidate_categories(&self) -> usize {
        self.invalidate_prefix(keys::CATEGORIES).await + self.invalidate_stats().await
    }

    pub async fn invalidate_bank_accounts(&self) -> usize {
        self.invalidate_prefix(keys::BANK_ACCOUNTS).await + self.invalidate_stats().await
    }

    pub async fn invalidate_payment_methods(&self) -> usize {
        self.invalidate_prefix(keys::PAYMENT_METHODS).await + self.invalidate_stats().await
    }

    pub async fn invalidate_revenues(&self) -> usize {
        self.invalidate_prefix(keys::REVENUES).await
            + self.invalidate_prefix(keys::REVENUE).await
            + self.invalidate_derived().await
    }

    pub async fn invalidate_expenses(&self) -> usize {
        self.invalidate_prefix(keys::EXPENSES).await
            + self.invalidate_prefix(keys::EXPENSE).await
            + self.invalidate_derived().await
    }

    pub async fn invalidate_all_transactions(&self) -> usize {
        self.invalidate_revenues().await + self.invalidate_expenses().await
    }

    pub async fn invalidate_stats(&self) -> usize {
        self.invalidate_prefix(keys::STATS).await
    }

    pub async fn invalidate_aggregations(&self) -> usize {
        self.invalidate_prefix(keys::AGGREGATIONS).await
    }

    pub async fn invalidate_all(&self) -> usize {
        self.invalidate_prefix(keys::ROOT).await
    }

    /// Dispatches a named invalidation.
    pub async fn invalidate(&self, target: InvalidationTarget) -> usize {
        match target {
            InvalidationTarget::Categories => self.invalidate_categories().await,
            InvalidationTarget::BankAccounts => self.invalidate_bank_accounts().await,
            InvalidationTarget::PaymentMethods => self.invalidate_payment_methods().await,
            InvalidationTarget::Revenues => self.invalidate_revenues().await,
            InvalidationTarget::Expenses => self.invalidate_expenses().await,
            InvalidationTarget::Transactions => self.invalidate_all_transactions().await,
            InvalidationTarget::Stats => self.invalidate_stats().await,
            InvalidationTarget::Aggregations => self.invalidate_aggregations().await,
            InvalidationTarget::All => self.invalidate_all().await,
        }
    }

    async fn invalidate_derived(&self) -> usize {
        self.invalidate_stats().await + self.invalidate_aggregations().await
    }

    async fn invalidate_prefix(&self, prefix: &str) -> usize {
        let removed = self
            .cache
            .invalidate_matching(&KeyPattern::prefix(prefix))
            .await;
        debug!("Invalidated {} entries under '{}'", removed, prefix);
        removed
    }

    async fn read<V: DeserializeOwned>(&self, key: &str) -> Option<V> {
        let value = self.cache.get(key).await?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                warn!("Cached value for '{}' has unexpected shape: {}", key, e);
                None
            }
        }
    }

    async fn write<V: Serialize>(&self, key: String, tier: CacheTier, value: &V) -> Result<()> {
        let document = serde_json::to_value(value)?;
        self.cache.set(key, document, Some(tier.ttl())).await
    }
}

// == Key Builders ==

fn categories_key(kind: Option<&str>) -> String {
    match kind {
        Some(kind) => format!("{}:kind:{}", keys::CATEGORIES, urlencoding::encode(kind)),
        None => keys::CATEGORIES.to_string(),
    }
}

fn filtered_key(prefix: &str, filters: &TransactionFilters) -> String {
    match filters.cache_signature() {
        Some(signature) => format!("{}:filtered:{}", prefix, signature),
        None => prefix.to_string(),
    }
}

fn entity_key(prefix: &str, id: &str) -> String {
    format!("{}{}", prefix, urlencoding::encode(id))
}

fn monthly_key(year: i32, month: u32) -> String {
    format!("{}{:04}-{:02}", keys::MONTHLY_AGGREGATION, year, month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn facade() -> FinancialCache {
        FinancialCache::with_config(CacheConfig::default()).unwrap()
    }

    #[test]
    fn test_key_builders() {
        assert_eq!(categories_key(None), "financial:categories");
        assert_eq!(
            categories_key(Some("income")),
            "financial:categories:kind:income"
        );
        assert_eq!(entity_key(keys::REVENUE, "r 1"), "financial:revenue:r%201");
        assert_eq!(monthly_key(2024, 3), "financial:aggregations:monthly:2024-03");

        let filters = TransactionFilters::new().with_status("pending");
        assert_eq!(
            filtered_key(keys::REVENUES, &filters),
            "financial:revenues:filtered:status:pending"
        );
        assert_eq!(
            filtered_key(keys::REVENUES, &TransactionFilters::new()),
            "financial:revenues"
        );
    }

    #[test]
    fn test_tier_ttls_are_ordered() {
        assert!(CacheTier::MasterData.ttl() > CacheTier::Transactions.ttl());
        assert!(CacheTier::Transactions.ttl() > CacheTier::Statistics.ttl());
    }

    #[test]
    fn test_invalidation_target_parsing() {
        assert_eq!(
            "bank_accounts".parse::<InvalidationTarget>().unwrap(),
            InvalidationTarget::BankAccounts
        );
        assert_eq!(InvalidationTarget::PaymentMethods.to_string(), "payment_methods");
        assert!(matches!(
            "budgets".parse::<InvalidationTarget>(),
            Err(CacheError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_typed_round_trip() {
        let cache = facade();
        let accounts = vec!["checking".to_string(), "savings".to_string()];

        cache.set_bank_accounts(&accounts).await.unwrap();

        let cached: Option<Vec<String>> = cache.get_bank_accounts().await;
        assert_eq!(cached, Some(accounts));
    }

    #[tokio::test]
    async fn test_shape_mismatch_reads_as_miss() {
        let cache = facade();
        cache.set_payment_methods(&json!({"not": "a list"})).await.unwrap();

        let cached: Option<Vec<String>> = cache.get_payment_methods().await;
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn test_filter_order_hits_same_entry() {
        let cache = facade();
        let written = TransactionFilters::new()
            .with_status("pending")
            .with_status("paid");
        let queried = TransactionFilters::new()
            .with_status("paid")
            .with_status("pending");

        cache.set_expenses(&written, &json!([1, 2, 3])).await.unwrap();

        let cached: Option<Value> = cache.get_expenses(&queried).await;
        assert_eq!(cached, Some(json!([1, 2, 3])));
    }

    #[tokio::test]
    async fn test_invalidate_categories_cascades_to_stats_only() {
        let cache = facade();
        let none = TransactionFilters::new();
        cache.set_categories(None, &json!(["food"])).await.unwrap();
        cache.set_categories(Some("expense"), &json!(["rent"])).await.unwrap();
        cache.set_stats(&none, &json!({"total": 10})).await.unwrap();
        cache.set_revenues(&none, &json!([])).await.unwrap();

        let removed = cache.invalidate_categories().await;

        assert_eq!(removed, 3);
        assert!(cache.get_categories::<Value>(None).await.is_none());
        assert!(cache.get_stats::<Value>(&none).await.is_none());
        assert!(cache.get_revenues::<Value>(&none).await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_stats_does_not_cascade_upwards() {
        let cache = facade();
        let none = TransactionFilters::new();
        cache.set_bank_accounts(&json!(["a"])).await.unwrap();
        cache.set_stats(&none, &json!({})).await.unwrap();

        assert_eq!(cache.invalidate_stats().await, 1);
        assert!(cache.get_bank_accounts::<Value>().await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_all_transactions() {
        let cache = facade();
        let none = TransactionFilters::new();
        cache.set_revenues(&none, &json!([])).await.unwrap();
        cache.set_expenses(&none, &json!([])).await.unwrap();
        cache.set_expense("e1", &json!({"id": "e1"})).await.unwrap();
        cache.set_payment_methods(&json!(["pix"])).await.unwrap();

        let removed = cache.invalidate(InvalidationTarget::Transactions).await;

        assert_eq!(removed, 3);
        assert!(cache.get_payment_methods::<Value>().await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_all_clears_namespace_only() {
        let handle: CacheHandle<Value> = CacheHandle::new(CacheConfig::default()).unwrap();
        handle.set("other:key", json!(1), None).await.unwrap();
        let cache = FinancialCache::new(handle.clone());
        cache.set_bank_accounts(&json!([])).await.unwrap();
        cache.set_monthly_aggregation(2024, 1, &json!({})).await.unwrap();

        assert_eq!(cache.invalidate_all().await, 2);
        assert!(handle.has("other:key").await);
    }
}

//! Configuration Module
//!
//! Engine configuration (`CacheConfig`), partial updates merged into it
//! (`CacheConfigUpdate`), and the host process settings loaded from
//! environment variables (`AppConfig`).

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::EvictionStrategy;
use crate::error::{CacheError, Result};

// == Cache Config ==
/// Settings for one cache engine instance.
///
/// Immutable while in use; replaced wholesale by merging a
/// [`CacheConfigUpdate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Default TTL in milliseconds for entries stored without explicit TTL
    pub default_ttl_ms: u64,
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Serialized payloads larger than this are stored compressed
    pub compression_threshold_bytes: usize,
    /// Ranking used to pick eviction victims
    pub eviction_strategy: EvictionStrategy,
    /// Whether hit/miss counters and memory estimation are maintained
    pub metrics_enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: 5 * 60 * 1000,
            max_entries: 1000,
            compression_threshold_bytes: 10 * 1024,
            eviction_strategy: EvictionStrategy::Lru,
            metrics_enabled: true,
        }
    }
}

impl CacheConfig {
    /// Default TTL as a `Duration`.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    /// Rejects values that would make the cache unbounded or useless.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(CacheError::InvalidConfig(
                "max_entries must be greater than zero".to_string(),
            ));
        }
        if self.default_ttl_ms == 0 {
            return Err(CacheError::InvalidConfig(
                "default_ttl_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns a copy with every field present in `update` replaced.
    pub fn merged(&self, update: &CacheConfigUpdate) -> Self {
        Self {
            default_ttl_ms: update.default_ttl_ms.unwrap_or(self.default_ttl_ms),
            max_entries: update.max_entries.unwrap_or(self.max_entries),
            compression_threshold_bytes: update
                .compression_threshold_bytes
                .unwrap_or(self.compression_threshold_bytes),
            eviction_strategy: update.eviction_strategy.unwrap_or(self.eviction_strategy),
            metrics_enabled: update.metrics_enabled.unwrap_or(self.metrics_enabled),
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl_ms = ttl.as_millis() as u64;
        self
    }

    pub fn with_compression_threshold(mut self, bytes: usize) -> Self {
        self.compression_threshold_bytes = bytes;
        self
    }

    pub fn with_eviction_strategy(mut self, strategy: EvictionStrategy) -> Self {
        self.eviction_strategy = strategy;
        self
    }

    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }
}

// == Cache Config Update ==
/// Partial configuration; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfigUpdate {
    pub default_ttl_ms: Option<u64>,
    pub max_entries: Option<usize>,
    pub compression_threshold_bytes: Option<usize>,
    pub eviction_strategy: Option<EvictionStrategy>,
    pub metrics_enabled: Option<bool>,
}

// == App Config ==
/// Host process configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Settings for the financial cache engine
    pub cache: CacheConfig,
    /// Interval in seconds between background expiry sweeps
    pub sweep_interval: u64,
    /// Admin HTTP server port
    pub server_port: u16,
}

impl AppConfig {
    /// Creates a new AppConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `COMPRESSION_THRESHOLD_BYTES` - Compression threshold (default: 10240)
    /// - `EVICTION_STRATEGY` - `lru`, `fifo` or `lfu` (default: lru)
    /// - `METRICS_ENABLED` - `true` or `false` (default: true)
    /// - `SWEEP_INTERVAL_SECS` - Expiry sweep frequency in seconds (default: 60)
    /// - `SERVER_PORT` - Admin HTTP port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache: CacheConfig {
                default_ttl_ms: env_or("DEFAULT_TTL_MS", defaults.cache.default_ttl_ms),
                max_entries: env_or("MAX_ENTRIES", defaults.cache.max_entries),
                compression_threshold_bytes: env_or(
                    "COMPRESSION_THRESHOLD_BYTES",
                    defaults.cache.compression_threshold_bytes,
                ),
                eviction_strategy: env_or("EVICTION_STRATEGY", defaults.cache.eviction_strategy),
                metrics_enabled: env_or("METRICS_ENABLED", defaults.cache.metrics_enabled),
            },
            sweep_interval: env_or("SWEEP_INTERVAL_SECS", defaults.sweep_interval),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            sweep_interval: 60,
            server_port: 3000,
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.max_entries, 1000);
        assert_eq!(config.default_ttl(), Duration::from_secs(300));
        assert_eq!(config.compression_threshold_bytes, 10 * 1024);
        assert_eq!(config.eviction_strategy, EvictionStrategy::Lru);
        assert!(config.metrics_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = CacheConfig::default().with_max_entries(0);
        assert!(matches!(config.validate(), Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let config = CacheConfig::default().with_default_ttl(Duration::ZERO);
        assert!(matches!(config.validate(), Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_merge_only_replaces_present_fields() {
        let base = CacheConfig::default();
        let update = CacheConfigUpdate {
            max_entries: Some(50),
            eviction_strategy: Some(EvictionStrategy::Lfu),
            ..Default::default()
        };

        let merged = base.merged(&update);
        assert_eq!(merged.max_entries, 50);
        assert_eq!(merged.eviction_strategy, EvictionStrategy::Lfu);
        assert_eq!(merged.default_ttl_ms, base.default_ttl_ms);
        assert_eq!(merged.metrics_enabled, base.metrics_enabled);
    }

    #[test]
    fn test_update_deserializes_partial_json() {
        let update: CacheConfigUpdate =
            serde_json::from_str(r#"{"max_entries": 10, "eviction_strategy": "fifo"}"#).unwrap();
        assert_eq!(update.max_entries, Some(10));
        assert_eq!(update.eviction_strategy, Some(EvictionStrategy::Fifo));
        assert!(update.default_ttl_ms.is_none());
    }

    #[test]
    fn test_app_config_from_env_defaults() {
        env::remove_var("MAX_ENTRIES");
        env::remove_var("DEFAULT_TTL_MS");
        env::remove_var("COMPRESSION_THRESHOLD_BYTES");
        env::remove_var("EVICTION_STRATEGY");
        env::remove_var("METRICS_ENABLED");
        env::remove_var("SWEEP_INTERVAL_SECS");
        env::remove_var("SERVER_PORT");

        let config = AppConfig::from_env();
        assert_eq!(config.cache, CacheConfig::default());
        assert_eq!(config.sweep_interval, 60);
        assert_eq!(config.server_port, 3000);
    }
}

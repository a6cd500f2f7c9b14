//! Cache Engine Module
//!
//! Main cache engine combining HashMap storage with TTL expiration, ranked
//! eviction, threshold compression and metrics.

use std::collections::HashMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::compression;
use crate::cache::entry::current_timestamp_ms;
use crate::cache::eviction::eviction_batch_size;
use crate::cache::metrics::{estimate_entry_bytes, format_bytes};
use crate::cache::{CacheEntry, CacheInfo, CacheMetrics, KeyPattern, StoredValue};
use crate::config::{CacheConfig, CacheConfigUpdate};
use crate::error::{CacheError, Result};

// == Cache Engine ==
/// Single-owner cache storage. All operations run to completion; share it
/// through [`CacheHandle`](crate::cache::CacheHandle).
#[derive(Debug)]
pub struct CacheEngine<T> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// Performance counters
    metrics: CacheMetrics,
    config: CacheConfig,
    /// Logical clock ordering inserts and accesses
    tick: u64,
}

impl<T> CacheEngine<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    // == Constructor ==
    /// Creates an empty engine after validating `config`.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            entries: HashMap::new(),
            metrics: CacheMetrics::new(),
            config,
            tick: 0,
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Update Config ==
    /// Merges `update` into the current configuration.
    ///
    /// If the new capacity is below the current size, the lowest-ranked
    /// entries are evicted immediately.
    pub fn update_config(&mut self, update: &CacheConfigUpdate) -> Result<()> {
        let merged = self.config.merged(update);
        merged.validate()?;
        self.config = merged;

        if self.entries.len() > self.config.max_entries {
            let excess = self.entries.len() - self.config.max_entries;
            self.evict(excess);
        }
        self.refresh_footprint();
        Ok(())
    }

    // == Set ==
    /// Stores a value, overwriting any existing entry for `key`.
    ///
    /// Payloads whose serialized size exceeds the compression threshold are
    /// stored compressed. When inserting a new key into a full store, 10% of
    /// capacity is evicted first.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL (uses the configured default if None)
    pub fn set(&mut self, key: impl Into<String>, value: T, ttl: Option<Duration>) -> Result<()> {
        let key = key.into();
        let ttl_ms = match ttl {
            Some(ttl) if ttl.is_zero() => {
                return Err(CacheError::InvalidRequest(format!(
                    "TTL for key '{}' must be greater than zero",
                    key
                )));
            }
            Some(ttl) => ttl.as_millis() as u64,
            None => self.config.default_ttl_ms,
        };

        let payload = compression::encode(&value, self.config.compression_threshold_bytes);

        if !self.entries.contains_key(&key) && self.entries.len() >= self.config.max_entries {
            self.evict(eviction_batch_size(self.config.max_entries));
        }

        let stored = match payload.compressed {
            Some(bytes) => StoredValue::Compressed(bytes),
            None => StoredValue::Plain(value),
        };
        let tick = self.next_tick();
        let entry = CacheEntry::new(stored, ttl_ms, payload.size_bytes, current_timestamp_ms(), tick);
        self.entries.insert(key, entry);

        self.refresh_footprint();
        Ok(())
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns None if the key is absent or expired; expired entries are
    /// removed. A hit bumps the entry's access count and recency.
    pub fn get(&mut self, key: &str) -> Option<T> {
        let now = current_timestamp_ms();

        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired_at(now),
            None => {
                self.record_miss();
                return None;
            }
        };

        if expired {
            self.entries.remove(key);
            self.metrics.record_expired(1);
            self.refresh_footprint();
            self.record_miss();
            return None;
        }

        let tick = self.next_tick();
        let entry = self.entries.get_mut(key)?;
        entry.touch(now, tick);

        let value = match &entry.value {
            StoredValue::Plain(value) => Some(value.clone()),
            StoredValue::Compressed(bytes) => match compression::decode(bytes) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Dropping unreadable entry '{}': {}", key, e);
                    None
                }
            },
        };

        match value {
            Some(value) => {
                self.record_hit();
                Some(value)
            }
            None => {
                self.entries.remove(key);
                self.refresh_footprint();
                self.record_miss();
                None
            }
        }
    }

    // == Has ==
    /// True if a live entry exists. Does not touch access statistics.
    pub fn has(&self, key: &str) -> bool {
        let now = current_timestamp_ms();
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired_at(now))
            .unwrap_or(false)
    }

    /// Read-only view of an entry's metadata, expired or not.
    pub fn entry(&self, key: &str) -> Option<&CacheEntry<T>> {
        self.entries.get(key)
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether anything was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.refresh_footprint();
        }
        removed
    }

    // == Invalidate Pattern ==
    /// Removes every key matched by `pattern` (a regular expression, or a
    /// literal substring if it does not compile).
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_pattern(&mut self, pattern: &str) -> usize {
        self.invalidate_matching(&KeyPattern::new(pattern))
    }

    /// Removes every key matched by a prepared pattern.
    pub fn invalidate_matching(&mut self, pattern: &KeyPattern) -> usize {
        let keys: Vec<String> = self
            .entries
            .keys()
            .filter(|key| pattern.matches(key))
            .cloned()
            .collect();

        for key in &keys {
            self.entries.remove(key);
        }

        if !keys.is_empty() {
            self.refresh_footprint();
            debug!("Invalidated {} entries matching {:?}", keys.len(), pattern);
        }
        keys.len()
    }

    // == Purge Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();
        for key in expired_keys {
            self.entries.remove(&key);
        }

        if count > 0 {
            self.metrics.record_expired(count);
            self.refresh_footprint();
        }
        count
    }

    // == Clear ==
    /// Empties the store and resets all metrics.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.metrics = CacheMetrics::new();
    }

    // == Metrics ==
    /// Returns current cache metrics.
    pub fn metrics(&self) -> CacheMetrics {
        let mut metrics = self.metrics.clone();
        metrics.entry_count = self.entries.len();
        metrics
    }

    // == Info ==
    /// Returns entry count, formatted memory estimate and oldest/newest keys.
    pub fn info(&self) -> CacheInfo {
        let oldest_key = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.inserted_tick)
            .map(|(key, _)| key.clone());
        let newest_key = self
            .entries
            .iter()
            .max_by_key(|(_, entry)| entry.inserted_tick)
            .map(|(key, _)| key.clone());

        CacheInfo {
            entry_count: self.entries.len(),
            memory_usage: format_bytes(self.estimated_memory()),
            oldest_key,
            newest_key,
        }
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes the `count` lowest-ranked entries under the configured strategy.
    fn evict(&mut self, count: usize) {
        let victims = self
            .config
            .eviction_strategy
            .select_victims(&self.entries, count);

        for key in &victims {
            self.entries.remove(key);
        }

        self.metrics.record_evictions(victims.len());
        debug!(
            "Evicted {} entries ({} strategy)",
            victims.len(),
            self.config.eviction_strategy
        );
    }

    fn estimated_memory(&self) -> usize {
        self.entries
            .iter()
            .map(|(key, entry)| estimate_entry_bytes(key, entry.size_bytes))
            .sum()
    }

    fn refresh_footprint(&mut self) {
        let memory = if self.config.metrics_enabled {
            self.estimated_memory()
        } else {
            0
        };
        self.metrics.set_footprint(self.entries.len(), memory);
    }

    fn record_hit(&mut self) {
        if self.config.metrics_enabled {
            self.metrics.record_hit();
        }
    }

    fn record_miss(&mut self) {
        if self.config.metrics_enabled {
            self.metrics.record_miss();
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

//! Shared Cache Handle
//!
//! Cloneable async front for a [`CacheEngine`], plus the get-or-set helpers
//! that suspend on an external fetch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::cache::{CacheEngine, CacheInfo, CacheMetrics, KeyPattern};
use crate::config::{CacheConfig, CacheConfigUpdate};
use crate::error::Result;

type InFlight = Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>;

// == Cache Handle ==
/// Thread-safe handle to one cache engine.
///
/// Every operation takes the engine lock only for its own duration; the
/// lock is never held while a get-or-set factory is running.
pub struct CacheHandle<T> {
    engine: Arc<RwLock<CacheEngine<T>>>,
    /// Per-key gates used by `get_or_set_coalesced`
    in_flight: InFlight,
}

impl<T> Clone for CacheHandle<T> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<T> CacheHandle<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    /// Creates a handle around a new engine built from `config`.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Ok(Self::from_engine(CacheEngine::new(config)?))
    }

    pub fn from_engine(engine: CacheEngine<T>) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn get(&self, key: &str) -> Option<T> {
        self.engine.write().await.get(key)
    }

    pub async fn set(&self, key: impl Into<String>, value: T, ttl: Option<Duration>) -> Result<()> {
        self.engine.write().await.set(key, value, ttl)
    }

    pub async fn has(&self, key: &str) -> bool {
        self.engine.read().await.has(key)
    }

    /// Whether the entry for `key` is held compressed, None if absent.
    pub async fn is_compressed(&self, key: &str) -> Option<bool> {
        self.engine
            .read()
            .await
            .entry(key)
            .map(|entry| entry.is_compressed())
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.engine.write().await.delete(key)
    }

    pub async fn invalidate_pattern(&self, pattern: &str) -> usize {
        self.engine.write().await.invalidate_pattern(pattern)
    }

    pub async fn invalidate_matching(&self, pattern: &KeyPattern) -> usize {
        self.engine.write().await.invalidate_matching(pattern)
    }

    pub async fn purge_expired(&self) -> usize {
        self.engine.write().await.purge_expired()
    }

    pub async fn clear(&self) {
        self.engine.write().await.clear()
    }

    pub async fn metrics(&self) -> CacheMetrics {
        self.engine.read().await.metrics()
    }

    pub async fn info(&self) -> CacheInfo {
        self.engine.read().await.info()
    }

    pub async fn config(&self) -> CacheConfig {
        self.engine.read().await.config().clone()
    }

    pub async fn update_config(&self, update: &CacheConfigUpdate) -> Result<CacheConfig> {
        let mut engine = self.engine.write().await;
        engine.update_config(update)?;
        Ok(engine.config().clone())
    }

    pub async fn len(&self) -> usize {
        self.engine.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.engine.read().await.is_empty()
    }

    // == Get Or Set ==
    /// Returns the cached value, or runs `factory`, stores its result and
    /// returns it.
    ///
    /// Concurrent misses on the same key each run their own factory. A
    /// factory error is returned unchanged and nothing is cached. A store
    /// failure is logged and the fetched value is still returned.
    pub async fn get_or_set<F, Fut, E>(
        &self,
        key: &str,
        factory: F,
        ttl: Option<Duration>,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = factory().await?;
        self.store_fetched(key, &value, ttl).await;
        Ok(value)
    }

    // == Get Or Set (Coalesced) ==
    /// Like [`get_or_set`](Self::get_or_set), but concurrent misses on one
    /// key share a single factory run.
    ///
    /// Callers that arrive while a fetch is pending wait for it and then
    /// re-read the cache. If the pending fetch failed, the next waiter runs
    /// its own factory.
    pub async fn get_or_set_coalesced<F, Fut, E>(
        &self,
        key: &str,
        factory: F,
        ttl: Option<Duration>,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let gate = {
            let mut in_flight = self.in_flight.lock().await;
            Arc::clone(
                in_flight
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        let result = {
            let _guard = gate.lock().await;

            // A previous holder of the gate may have stored the value
            let cached = if self.has(key).await {
                self.get(key).await
            } else {
                None
            };
            match cached {
                Some(value) => {
                    debug!("Coalesced fetch for '{}' served from cache", key);
                    Ok(value)
                }
                None => match factory().await {
                    Ok(value) => {
                        self.store_fetched(key, &value, ttl).await;
                        Ok(value)
                    }
                    Err(e) => Err(e),
                },
            }
        };

        self.release_gate(key, &gate).await;
        result
    }

    async fn store_fetched(&self, key: &str, value: &T, ttl: Option<Duration>) {
        if let Err(e) = self.set(key, value.clone(), ttl).await {
            warn!("Fetched value for '{}' was not cached: {}", key, e);
        }
    }

    /// Drops the registry slot once no other caller holds the gate.
    async fn release_gate(&self, key: &str, gate: &Arc<Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().await;
        let last_user = in_flight
            .get(key)
            .map(|current| Arc::ptr_eq(current, gate) && Arc::strong_count(gate) <= 2)
            .unwrap_or(false);
        if last_user {
            in_flight.remove(key);
        }
    }

    #[cfg(test)]
    async fn in_flight_len(&self) -> usize {
        self.in_flight.lock().await.len()
    }
}

//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache entries, so
//! entries nobody reads again are still reclaimed.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheHandle;

/// Spawns a background task that periodically purges expired entries.
///
/// The task runs in an infinite loop, sleeping for `interval` between
/// sweeps. Each sweep holds the engine's write lock only while purging.
///
/// # Returns
/// A JoinHandle for the spawned task. The owner aborts it at shutdown.
///
/// # Example
/// ```ignore
/// let cache = CacheHandle::<serde_json::Value>::new(CacheConfig::default())?;
/// let sweep = spawn_sweep_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// sweep.abort();
/// ```
pub fn spawn_sweep_task<T>(cache: CacheHandle<T>, interval: Duration) -> JoinHandle<()>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!("Starting expiry sweep task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.purge_expired().await;

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}

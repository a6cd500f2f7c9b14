//! Eviction Module
//!
//! Ranks entries for removal when the store is full.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cache::CacheEntry;
use crate::error::CacheError;

/// Share of `max_entries` removed by one eviction pass.
pub const EVICTION_FRACTION: f64 = 0.1;

// == Eviction Strategy ==
/// Policy used to rank entries for eviction. Lowest rank goes first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionStrategy {
    /// Least recently used (oldest access first)
    #[default]
    Lru,
    /// First in, first out (oldest insertion first)
    Fifo,
    /// Least frequently used (lowest access count first)
    Lfu,
}

impl EvictionStrategy {
    /// Sort key for an entry; ties fall back to insertion order.
    fn rank<T>(&self, entry: &CacheEntry<T>) -> (u64, u64) {
        match self {
            EvictionStrategy::Lru => (entry.accessed_tick, entry.inserted_tick),
            EvictionStrategy::Fifo => (entry.inserted_tick, 0),
            EvictionStrategy::Lfu => (entry.access_count, entry.inserted_tick),
        }
    }

    // == Select Victims ==
    /// Returns the keys of the `count` lowest-ranked entries.
    pub fn select_victims<'a, T: 'a, I>(&self, entries: I, count: usize) -> Vec<String>
    where
        I: IntoIterator<Item = (&'a String, &'a CacheEntry<T>)>,
    {
        let mut ranked: Vec<((u64, u64), &String)> = entries
            .into_iter()
            .map(|(key, entry)| (self.rank(entry), key))
            .collect();
        ranked.sort_unstable_by_key(|(rank, _)| *rank);

        ranked
            .into_iter()
            .take(count)
            .map(|(_, key)| key.clone())
            .collect()
    }
}

impl fmt::Display for EvictionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvictionStrategy::Lru => "lru",
            EvictionStrategy::Fifo => "fifo",
            EvictionStrategy::Lfu => "lfu",
        };
        f.write_str(name)
    }
}

impl FromStr for EvictionStrategy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lru" => Ok(EvictionStrategy::Lru),
            "fifo" => Ok(EvictionStrategy::Fifo),
            "lfu" => Ok(EvictionStrategy::Lfu),
            other => Err(CacheError::InvalidConfig(format!(
                "Unknown eviction strategy '{}'",
                other
            ))),
        }
    }
}

// == Batch Size ==
/// Number of entries removed per eviction pass: 10% of capacity, at least one.
pub fn eviction_batch_size(max_entries: usize) -> usize {
    ((max_entries as f64 * EVICTION_FRACTION).floor() as usize).max(1)
}

//! Cache Metrics Module
//!
//! Tracks cache performance counters and the approximate memory footprint.

use serde::Serialize;

/// Fixed bookkeeping overhead charged per entry when estimating memory.
pub const ENTRY_OVERHEAD_BYTES: usize = 64;

// == Cache Metrics ==
/// Snapshot of cache counters. Reset by `clear`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheMetrics {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (absent, expired or unreadable)
    pub misses: u64,
    /// hits + misses
    pub total_requests: u64,
    /// hits / total_requests, 0 when no requests have been made
    pub hit_rate: f64,
    /// Approximate bytes held by all entries
    pub estimated_memory_bytes: usize,
    /// Current number of entries in the cache
    pub entry_count: usize,
    /// Entries removed to stay within capacity
    pub evictions: u64,
    /// Entries removed because their TTL elapsed
    pub expired_removals: u64,
}

impl CacheMetrics {
    // == Constructor ==
    /// Creates a new CacheMetrics with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    pub fn record_hit(&mut self) {
        self.hits += 1;
        self.total_requests += 1;
        self.refresh_hit_rate();
    }

    // == Record Miss ==
    pub fn record_miss(&mut self) {
        self.misses += 1;
        self.total_requests += 1;
        self.refresh_hit_rate();
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    pub fn record_expired(&mut self, count: usize) {
        self.expired_removals += count as u64;
    }

    // == Update Footprint ==
    /// Updates the entry count and memory estimate.
    pub fn set_footprint(&mut self, entry_count: usize, estimated_memory_bytes: usize) {
        self.entry_count = entry_count;
        self.estimated_memory_bytes = estimated_memory_bytes;
    }

    fn refresh_hit_rate(&mut self) {
        self.hit_rate = if self.total_requests == 0 {
            0.0
        } else {
            self.hits as f64 / self.total_requests as f64
        };
    }
}

// == Memory Estimation ==
/// Approximate footprint of one entry.
///
/// Keys are charged two bytes per UTF-16 code unit, payloads by their
/// serialized size, plus [`ENTRY_OVERHEAD_BYTES`].
pub fn estimate_entry_bytes(key: &str, payload_bytes: usize) -> usize {
    key.encode_utf16().count() * 2 + payload_bytes + ENTRY_OVERHEAD_BYTES
}

/// Formats a byte count for dashboards, e.g. `1.50 KB`.
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

// == Cache Info ==
/// Operational summary for dashboards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheInfo {
    pub entry_count: usize,
    /// Human readable memory estimate
    pub memory_usage: String,
    /// Key of the earliest stored entry
    pub oldest_key: Option<String>,
    /// Key of the latest stored entry
    pub newest_key: Option<String>,
}

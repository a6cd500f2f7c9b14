//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL and access
//! bookkeeping.

use std::time::{SystemTime, UNIX_EPOCH};

// == Stored Value ==
/// Payload as held by the store: either the value itself or its
/// compressed serialized form.
#[derive(Debug, Clone)]
pub enum StoredValue<T> {
    Plain(T),
    Compressed(Vec<u8>),
}

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The stored payload
    pub value: StoredValue<T>,
    /// Store timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Time to live in milliseconds
    pub ttl_ms: u64,
    /// Number of successful reads
    pub access_count: u64,
    /// Last read (or store) timestamp (Unix milliseconds)
    pub last_accessed_at: u64,
    /// Serialized payload size at store time
    pub size_bytes: usize,
    /// Logical insertion order
    pub(crate) inserted_tick: u64,
    /// Logical order of the latest access
    pub(crate) accessed_tick: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new entry stored at `now` with logical order `tick`.
    pub fn new(value: StoredValue<T>, ttl_ms: u64, size_bytes: usize, now: u64, tick: u64) -> Self {
        Self {
            value,
            stored_at: now,
            ttl_ms,
            access_count: 0,
            last_accessed_at: now,
            size_bytes,
            inserted_tick: tick,
            accessed_tick: tick,
        }
    }

    /// True if the payload is held in compressed form.
    pub fn is_compressed(&self) -> bool {
        matches!(self.value, StoredValue::Compressed(_))
    }

    // == Is Expired ==
    /// Checks expiry against an explicit clock reading.
    ///
    /// An entry is expired once strictly more than `ttl_ms` has elapsed since
    /// it was stored.
    pub fn is_expired_at(&self, now: u64) -> bool {
        now.saturating_sub(self.stored_at) > self.ttl_ms
    }

    /// Checks expiry against the current wall clock.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Remaining lifetime in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        let elapsed = current_timestamp_ms().saturating_sub(self.stored_at);
        self.ttl_ms.saturating_sub(elapsed)
    }

    // == Touch ==
    /// Records a successful read.
    pub fn touch(&mut self, now: u64, tick: u64) {
        self.access_count += 1;
        self.last_accessed_at = now;
        self.accessed_tick = tick;
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn plain(value: &str, ttl_ms: u64) -> CacheEntry<String> {
        CacheEntry::new(
            StoredValue::Plain(value.to_string()),
            ttl_ms,
            value.len(),
            current_timestamp_ms(),
            1,
        )
    }

    #[test]
    fn test_entry_creation() {
        let entry = plain("test_value", 60_000);

        assert!(matches!(&entry.value, StoredValue::Plain(v) if v == "test_value"));
        assert_eq!(entry.access_count, 0);
        assert_eq!(entry.last_accessed_at, entry.stored_at);
        assert!(!entry.is_compressed());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_compressed_flag() {
        let entry: CacheEntry<String> =
            CacheEntry::new(StoredValue::Compressed(vec![1, 2, 3]), 1000, 3, 0, 1);
        assert!(entry.is_compressed());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry: CacheEntry<String> =
            CacheEntry::new(StoredValue::Plain("v".to_string()), 100, 1, 1_000, 1);

        // Exactly ttl elapsed is still live; one more millisecond is not
        assert!(!entry.is_expired_at(1_100));
        assert!(entry.is_expired_at(1_101));
    }

    #[test]
    fn test_clock_before_store_is_not_expired() {
        let entry: CacheEntry<String> =
            CacheEntry::new(StoredValue::Plain("v".to_string()), 100, 1, 5_000, 1);
        assert!(!entry.is_expired_at(4_000));
    }

    #[test]
    fn test_entry_expired_in_the_past() {
        let mut entry = plain("old", 1_000);
        entry.stored_at -= 5_000;

        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining_ms(), 0);
    }

    #[test]
    fn test_ttl_remaining_ms() {
        let entry = plain("v", 10_000);

        let remaining = entry.ttl_remaining_ms();
        assert!(remaining <= 10_000);
        assert!(remaining >= 9_000);
    }

    #[test]
    fn test_touch_updates_bookkeeping() {
        let mut entry = plain("v", 10_000);
        entry.touch(entry.stored_at + 5, 7);
        entry.touch(entry.stored_at + 9, 8);

        assert_eq!(entry.access_count, 2);
        assert_eq!(entry.last_accessed_at, entry.stored_at + 9);
        assert_eq!(entry.accessed_tick, 8);
        assert_eq!(entry.inserted_tick, 1);
    }
}

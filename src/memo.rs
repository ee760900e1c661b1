//! Bounded in-process memo cache.
//!
//! Holds entity labels, provider entities, external manifests and access
//! tokens. Entries expire a fixed time after insertion; when full, the oldest
//! insertion is evicted.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};

/// Default capacity for provider memo caches.
pub const DEFAULT_MAX_LEN: usize = 100;

/// Default lifetime for provider memo caches (30 minutes).
pub const DEFAULT_TTL_SECS: i64 = 1800;

struct MemoEntry<V> {
    value: V,
    inserted: DateTime<Utc>,
}

/// Thread-safe TTL cache with a length bound.
pub struct MemoCache<K, V> {
    entries: DashMap<K, MemoEntry<V>>,
    max_len: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(max_len: usize, ttl: Duration) -> Self {
        Self::with_clock(max_len, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(max_len: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            max_len,
            ttl,
            clock,
        }
    }

    /// Get a live value, dropping it if expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let entry = self.entries.get(key)?;
        if now - entry.inserted < self.ttl {
            return Some(entry.value.clone());
        }
        drop(entry);
        self.entries.remove(key);
        None
    }

    pub fn insert(&self, key: K, value: V) {
        let now = self.clock.now();
        self.entries.retain(|_, e| now - e.inserted < self.ttl);
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_len {
            self.evict_oldest();
        }
        self.entries.insert(
            key,
            MemoEntry {
                value,
                inserted: now,
            },
        );
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.inserted)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

impl<K, V> Default for MemoCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LEN, Duration::seconds(DEFAULT_TTL_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn cache_with_clock(max_len: usize) -> (MemoCache<String, u32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = MemoCache::with_clock(max_len, Duration::minutes(30), clock.clone());
        (cache, clock)
    }

    #[test]
    fn insert_and_get() {
        let (cache, _) = cache_with_clock(10);
        cache.insert("a".into(), 1);
        assert_eq!(cache.get(&"a".into()), Some(1));
        assert_eq!(cache.get(&"b".into()), None);
    }

    #[test]
    fn entries_expire() {
        let (cache, clock) = cache_with_clock(10);
        cache.insert("a".into(), 1);
        clock.advance(Duration::minutes(29));
        assert!(cache.contains(&"a".into()));
        clock.advance(Duration::minutes(2));
        assert_eq!(cache.get(&"a".into()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn evicts_oldest_when_full() {
        let (cache, clock) = cache_with_clock(2);
        cache.insert("a".into(), 1);
        clock.advance(Duration::seconds(1));
        cache.insert("b".into(), 2);
        clock.advance(Duration::seconds(1));
        cache.insert("c".into(), 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a".into()), None);
        assert_eq!(cache.get(&"c".into()), Some(3));
    }

    #[test]
    fn reinsert_does_not_evict() {
        let (cache, _) = cache_with_clock(2);
        cache.insert("a".into(), 1);
        cache.insert("b".into(), 2);
        cache.insert("a".into(), 10);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a".into()), Some(10));
        assert_eq!(cache.get(&"b".into()), Some(2));
    }
}

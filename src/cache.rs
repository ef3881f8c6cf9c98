use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Bounded, TTL'd key-value cache with insertion-order eviction.
///
/// Eviction removes the oldest-inserted key first; this is best-effort memory
/// control, not access-order LRU. Expired entries are purged lazily on read.
pub struct TtlCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    order: VecDeque<String>,
    ttl: Duration,
    max_entries: usize,
}

impl<V> TtlCache<V> {
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            ttl,
            max_entries,
        }
    }

    /// Returns the cached value unless it is missing or expired. An expired
    /// entry is deleted on the spot.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.inserted_at.elapsed() > self.ttl,
            None => return None,
        };

        if expired {
            self.remove(key);
            return None;
        }

        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Inserts or overwrites, stamping the entry with the current time.
    /// Callers invoke `enforce_limit` separately after insertion.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        if self.entries.contains_key(&key) {
            self.order.retain(|k| k != &key);
        }
        self.order.push_back(key.clone());
        self.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Evicts oldest-inserted entries until the cache is within its bound.
    pub fn enforce_limit(&mut self) {
        while self.entries.len() > self.max_entries {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.order.retain(|k| k != key);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Rewinds an entry's insertion timestamp so expiry can be tested without
    /// sleeping.
    #[cfg(test)]
    fn backdate(&mut self, key: &str, by: Duration) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.inserted_at -= by;
        }
    }
}

use std::{
    hash::Hash,
    time::{Duration, Instant},
};

use dashmap::DashMap;

/// Concurrent map whose entries expire after a fixed time-to-live.
///
/// Expired entries are dropped lazily on read.
pub struct TtlCache<K, V> {
    entries: DashMap<K, (Instant, V)>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        TtlCache {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let fresh = self
            .entries
            .get(key)
            .and_then(|entry| (entry.0.elapsed() < self.ttl).then(|| entry.1.clone()));

        if fresh.is_none() {
            self.entries.remove_if(key, |_, (stored, _)| stored.elapsed() >= self.ttl);
        }

        fresh
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(key, (Instant::now(), value));
    }

    pub fn invalidate(&self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }
}

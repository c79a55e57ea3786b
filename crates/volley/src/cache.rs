//! Reference-data cache with a time-based freshness rule.
//!
//! Lookup tables fetched from the remote API (status labels, user rosters)
//! change rarely but not never. [`RefCache`] holds them as an explicit,
//! owned object: a read returns the cached value together with a freshness
//! flag, and the caller decides whether a stale value is good enough or
//! worth a refresh. Stale entries are retained until [`RefCache::purge_stale`]
//! is called, so a refresh that fails still leaves the previous value
//! available.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

/// Shared reference-data cache. Entries are fresh while younger than the
/// configured time-to-live.
pub struct RefCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> RefCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value and whether it is still fresh.
    pub fn get<Q>(&self, key: &Q) -> Option<(V, bool)>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let entries = self.entries.lock();
        entries.get(key).map(|entry| {
            let fresh = entry.stored_at.elapsed() < self.ttl;
            (entry.value.clone(), fresh)
        })
    }

    /// Stores `value`, stamping it with the current instant. Replaces any
    /// previous entry for the key.
    pub fn insert(&self, key: K, value: V) {
        self.entries.lock().insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drops every entry past its time-to-live.
    pub fn purge_stale(&self) {
        let ttl = self.ttl;
        self.entries
            .lock()
            .retain(|_, entry| entry.stored_at.elapsed() < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

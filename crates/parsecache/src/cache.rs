//! SharedCache: BoundedCache behind a single lock

use std::hash::Hash;
use std::sync::Arc;
use parking_lot::Mutex;

use crate::error::Result;
use crate::lru::BoundedCache;
use crate::stats::CacheStats;

/// Thread-safe handle to a [`BoundedCache`]
///
/// One mutex guards the mapping, queue and refcounts, so every operation is
/// serialized. The factory runs while the lock is held: two threads missing on
/// the same key still produce a single factory call.
pub struct SharedCache<K, V, F> {
    /// Cache state
    inner: Arc<Mutex<BoundedCache<K, V, F>>>,

    /// Statistics, readable without taking the lock
    stats: Arc<CacheStats>,

    /// Cache capacity
    capacity: usize,
}

impl<K, V, F> Clone for SharedCache<K, V, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            stats: Arc::clone(&self.stats),
            capacity: self.capacity,
        }
    }
}

impl<K, V, F, E> SharedCache<K, V, F>
where
    K: Hash + Eq + Clone,
    V: Clone,
    F: FnMut(&K) -> std::result::Result<V, E>,
{
    /// Create a shared cache with the given capacity and factory
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of distinct keys retained
    /// * `factory` - Builds the value for a key on a miss
    ///
    /// # Returns
    /// * `Result<SharedCache>` - Fails with `ZeroCapacity` for a capacity of 0
    pub fn new(capacity: usize, factory: F) -> Result<Self> {
        let cache = BoundedCache::new(capacity, factory)?;
        let stats = cache.stats_handle();

        Ok(Self {
            inner: Arc::new(Mutex::new(cache)),
            stats,
            capacity,
        })
    }

    /// Return the cached value for `key`, computing it on a miss
    pub fn get_or_compute(&self, key: K) -> std::result::Result<V, E> {
        self.inner.lock().get_or_compute(key)
    }
}

impl<K, V, F> SharedCache<K, V, F>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Store a value without calling the factory
    pub fn put(&self, key: K, value: V) {
        self.inner.lock().put(key, value);
    }

    /// Remove an entry, returning its value if it was cached
    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.lock().remove(key)
    }

    /// Cached value for `key`, without recording a touch
    pub fn peek(&self, key: &K) -> Option<V> {
        self.inner.lock().peek(key).cloned()
    }

    /// Check whether `key` is currently cached
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    /// Get current number of cached entries
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Number of touches in the access queue
    pub fn queue_len(&self) -> usize {
        self.inner.lock().queue_len()
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Drop all entries and reset statistics
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

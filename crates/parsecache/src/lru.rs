//! Approximate LRU cache built from a touch queue and reference counts.
//!
//! Every access appends the key to a FIFO queue and bumps its refcount.
//! Eviction pops touches off the front and only drops an entry once its last
//! touch is gone, so a key touched recently outlives its own stale touches.
//! The queue is compacted to one touch per live key whenever it grows past
//! `4 * capacity`.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::Arc;
use ahash::RandomState;
use tracing::{debug, trace};

use crate::error::{self, Error};
use crate::stats::CacheStats;

/// Queue length, as a multiple of capacity, above which the queue is compacted
const COMPACT_FACTOR: usize = 4;

/// Fixed-capacity get-or-compute cache
///
/// Not internally synchronized: every mutating call takes `&mut self`. Wrap it
/// in [`SharedCache`](crate::SharedCache) to share it between threads.
pub struct BoundedCache<K, V, F> {
    map: HashMap<K, V, RandomState>,
    queue: VecDeque<K>,
    refcount: HashMap<K, usize, RandomState>,
    factory: F,
    capacity: usize,
    stats: Arc<CacheStats>,
}

impl<K, V, F, E> BoundedCache<K, V, F>
where
    K: Hash + Eq + Clone,
    V: Clone,
    F: FnMut(&K) -> Result<V, E>,
{
    /// Create a cache holding at most `capacity` distinct keys
    ///
    /// `factory` materializes the value for a key on a miss.
    pub fn new(capacity: usize, factory: F) -> error::Result<Self> {
        if capacity == 0 {
            return Err(Error::ZeroCapacity);
        }

        Ok(Self {
            map: HashMap::with_hasher(RandomState::new()),
            queue: VecDeque::new(),
            refcount: HashMap::with_hasher(RandomState::new()),
            factory,
            capacity,
            stats: Arc::new(CacheStats::new()),
        })
    }

    /// Return the cached value for `key`, computing it on a miss
    ///
    /// A factory error is returned as-is and leaves the cache untouched.
    pub fn get_or_compute(&mut self, key: K) -> Result<V, E> {
        let value = match self.map.get(&key) {
            Some(value) => {
                self.stats.record_hit();
                value.clone()
            }
            None => {
                self.stats.record_miss();
                let value = (self.factory)(&key)?;
                self.map.insert(key.clone(), value.clone());
                value
            }
        };

        self.touch(key);
        self.evict();
        Ok(value)
    }
}

impl<K, V, F> BoundedCache<K, V, F>
where
    K: Hash + Eq + Clone,
{
    /// Store `value` under `key` without calling the factory
    pub fn put(&mut self, key: K, value: V) {
        self.map.insert(key.clone(), value);
        self.stats.record_insert();
        self.touch(key);
        self.evict();
    }

    /// Drop `key` and every recorded touch of it
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.map.remove(key)?;
        self.refcount.remove(key);
        self.queue.retain(|k| k != key);
        Some(value)
    }

    /// Check whether `key` is currently cached
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Peek at a cached value without recording a touch
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Maximum number of distinct keys retained
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of touches currently recorded in the access queue
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Number of queued touches for `key`
    pub fn refcount(&self, key: &K) -> usize {
        self.refcount.get(key).copied().unwrap_or(0)
    }

    /// Cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub(crate) fn stats_handle(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }

    /// Drop every entry and touch, and reset statistics
    pub fn clear(&mut self) {
        self.map.clear();
        self.queue.clear();
        self.refcount.clear();
        self.stats.reset();
    }

    fn touch(&mut self, key: K) {
        *self.refcount.entry(key.clone()).or_insert(0) += 1;
        self.queue.push_back(key);
    }

    /// Spend one touch of `key`; true when it was the last one
    fn release(&mut self, key: &K) -> bool {
        match self.refcount.get_mut(key) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            _ => {
                self.refcount.remove(key);
                true
            }
        }
    }

    fn evict(&mut self) {
        while self.map.len() > self.capacity {
            let Some(key) = self.queue.pop_front() else {
                break;
            };
            if self.release(&key) && self.map.remove(&key).is_some() {
                self.stats.record_eviction();
                trace!(queue_len = self.queue.len(), "evicted cache entry");
            }
        }

        if self.queue.len() > self.capacity.saturating_mul(COMPACT_FACTOR) {
            self.compact();
        }
    }

    /// Collapse the queue to the most recent touch of each live key
    fn compact(&mut self) {
        let before = self.queue.len();
        let queue = std::mem::take(&mut self.queue);
        let mut kept = VecDeque::with_capacity(self.map.len());

        for key in queue {
            match self.refcount.get_mut(&key) {
                Some(count) if *count > 1 => *count -= 1,
                Some(_) => kept.push_back(key),
                None => {}
            }
        }

        self.queue = kept;
        self.stats.record_compaction();
        debug!(before, after = self.queue.len(), "compacted cache access queue");
    }

    #[cfg(test)]
    fn assert_invariants(&self) {
        assert!(self.map.len() <= self.capacity, "over capacity");

        let mut counted: HashMap<&K, usize> = HashMap::new();
        for key in &self.queue {
            *counted.entry(key).or_insert(0) += 1;
        }
        assert_eq!(counted.len(), self.refcount.len(), "refcount keys differ from queue keys");
        for (key, count) in &counted {
            assert_eq!(self.refcount.get(*key), Some(count), "refcount mismatch");
        }
        for key in self.map.keys() {
            assert!(self.refcount(key) >= 1, "cached key without a touch");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn upper_cache(
        capacity: usize,
    ) -> (
        BoundedCache<String, String, impl FnMut(&String) -> Result<String, String>>,
        Rc<Cell<usize>>,
    ) {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let cache = BoundedCache::new(capacity, move |key: &String| {
            counter.set(counter.get() + 1);
            if key == "bad" {
                Err(format!("cannot build {}", key))
            } else {
                Ok(key.to_uppercase())
            }
        })
        .unwrap();
        (cache, calls)
    }

    fn get(
        cache: &mut BoundedCache<String, String, impl FnMut(&String) -> Result<String, String>>,
        key: &str,
    ) -> Result<String, String> {
        cache.get_or_compute(key.to_string())
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = BoundedCache::new(0, |key: &u32| Ok::<_, ()>(*key));
        assert!(matches!(result, Err(Error::ZeroCapacity)));
    }

    #[test]
    fn test_single_computation() {
        let (mut cache, calls) = upper_cache(4);

        assert_eq!(get(&mut cache, "a").unwrap(), "A");
        assert_eq!(get(&mut cache, "a").unwrap(), "A");

        assert_eq!(calls.get(), 1);
        assert_eq!(cache.stats().hits(), 1);
        assert_eq!(cache.stats().misses(), 1);
    }

    #[test]
    fn test_eviction_order() {
        let (mut cache, _) = upper_cache(2);

        get(&mut cache, "a").unwrap();
        get(&mut cache, "b").unwrap();
        get(&mut cache, "c").unwrap();

        assert!(!cache.contains(&"a".to_string()));
        assert!(cache.contains(&"b".to_string()));
        assert!(cache.contains(&"c".to_string()));
        assert_eq!(cache.stats().evictions(), 1);
        cache.assert_invariants();
    }

    #[test]
    fn test_four_keys_capacity_three() {
        let (mut cache, calls) = upper_cache(3);

        for key in ["a", "b", "c", "d"] {
            get(&mut cache, key).unwrap();
        }
        assert_eq!(cache.len(), 3);
        assert!(!cache.contains(&"a".to_string()));

        assert_eq!(get(&mut cache, "b").unwrap(), "B");
        assert_eq!(calls.get(), 4);
        assert!(!cache.contains(&"a".to_string()));
        cache.assert_invariants();
    }

    #[test]
    fn test_recent_touch_survives_stale_one() {
        let (mut cache, _) = upper_cache(2);

        // Queue: a, b, a, c. The first "a" touch is stale, so "b" goes.
        get(&mut cache, "a").unwrap();
        get(&mut cache, "b").unwrap();
        get(&mut cache, "a").unwrap();
        get(&mut cache, "c").unwrap();

        assert!(cache.contains(&"a".to_string()));
        assert!(!cache.contains(&"b".to_string()));
        assert!(cache.contains(&"c".to_string()));
        assert_eq!(cache.refcount(&"a".to_string()), 1);
        cache.assert_invariants();
    }

    #[test]
    fn test_hot_key_compaction() {
        let (mut cache, calls) = upper_cache(3);
        let hot = "hot".to_string();

        for _ in 0..100 {
            get(&mut cache, "hot").unwrap();
            assert!(cache.contains(&hot));
            assert!(cache.queue_len() <= COMPACT_FACTOR * cache.capacity());
            cache.assert_invariants();
        }

        assert_eq!(calls.get(), 1);
        assert!(cache.stats().compactions() > 0);
    }

    #[test]
    fn test_compaction_leaves_one_touch_per_key() {
        let (mut cache, _) = upper_cache(2);

        // 4 * 2 = 8 touches are allowed; the ninth triggers compaction.
        for key in ["a", "b", "a", "b", "a", "b", "a", "b", "a"] {
            get(&mut cache, key).unwrap();
        }

        assert_eq!(cache.stats().compactions(), 1);
        assert_eq!(cache.queue_len(), 2);
        assert_eq!(cache.refcount(&"a".to_string()), 1);
        assert_eq!(cache.refcount(&"b".to_string()), 1);

        // "b" now holds the oldest touch and is evicted first.
        get(&mut cache, "c").unwrap();
        assert!(!cache.contains(&"b".to_string()));
        assert!(cache.contains(&"a".to_string()));
    }

    #[test]
    fn test_factory_error_leaves_no_entry() {
        let (mut cache, _) = upper_cache(3);
        get(&mut cache, "a").unwrap();
        let size_before = cache.len();
        let queue_before = cache.queue_len();

        let result = get(&mut cache, "bad");

        assert_eq!(result, Err("cannot build bad".to_string()));
        assert!(!cache.contains(&"bad".to_string()));
        assert_eq!(cache.len(), size_before);
        assert_eq!(cache.queue_len(), queue_before);
        assert_eq!(cache.refcount(&"bad".to_string()), 0);
        cache.assert_invariants();
    }

    #[test]
    fn test_put_bypasses_factory() {
        let (mut cache, calls) = upper_cache(2);

        cache.put("a".to_string(), "custom".to_string());
        assert_eq!(get(&mut cache, "a").unwrap(), "custom");
        assert_eq!(calls.get(), 0);

        cache.put("a".to_string(), "fresh".to_string());
        assert_eq!(cache.peek(&"a".to_string()).map(String::as_str), Some("fresh"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.refcount(&"a".to_string()), 3);
        assert_eq!(cache.stats().inserts(), 2);
        cache.assert_invariants();
    }

    #[test]
    fn test_put_evicts() {
        let (mut cache, _) = upper_cache(2);

        cache.put("a".to_string(), "1".to_string());
        cache.put("b".to_string(), "2".to_string());
        cache.put("c".to_string(), "3".to_string());

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&"a".to_string()));
        cache.assert_invariants();
    }

    #[test]
    fn test_remove() {
        let (mut cache, calls) = upper_cache(3);

        get(&mut cache, "a").unwrap();
        get(&mut cache, "b").unwrap();
        get(&mut cache, "a").unwrap();

        assert_eq!(cache.remove(&"a".to_string()), Some("A".to_string()));
        assert_eq!(cache.remove(&"a".to_string()), None);
        assert_eq!(cache.queue_len(), 1);
        cache.assert_invariants();

        get(&mut cache, "a").unwrap();
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_clear() {
        let (mut cache, _) = upper_cache(3);

        get(&mut cache, "a").unwrap();
        get(&mut cache, "b").unwrap();
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.queue_len(), 0);
        assert_eq!(cache.stats().misses(), 0);
        cache.assert_invariants();
    }

    use proptest::prelude::*;

    #[derive(Clone, Debug)]
    enum Op {
        Get(u8),
        Put(u8, u32),
        Remove(u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            6 => (0..12u8).prop_map(Op::Get),
            3 => (0..12u8, any::<u32>()).prop_map(|(k, v)| Op::Put(k, v)),
            1 => (0..12u8).prop_map(Op::Remove),
        ]
    }

    proptest! {
        /// Capacity and refcount bookkeeping hold after every call
        #[test]
        fn prop_invariants_hold(
            capacity in 1..6usize,
            ops in proptest::collection::vec(op_strategy(), 0..200),
        ) {
            // Key 0 always fails to build.
            let mut cache = BoundedCache::new(capacity, |key: &u8| {
                if *key == 0 { Err(()) } else { Ok(u32::from(*key) * 10) }
            }).unwrap();

            for op in ops {
                match op {
                    Op::Get(key) => {
                        let len_before = cache.len();
                        match cache.get_or_compute(key) {
                            Ok(_) => prop_assert!(cache.contains(&key)),
                            Err(()) => {
                                prop_assert_eq!(key, 0);
                                prop_assert!(!cache.contains(&key));
                                prop_assert_eq!(cache.len(), len_before);
                            }
                        }
                    }
                    Op::Put(key, value) => {
                        cache.put(key, value);
                        prop_assert_eq!(cache.peek(&key), Some(&value));
                    }
                    Op::Remove(key) => {
                        cache.remove(&key);
                        prop_assert!(!cache.contains(&key));
                    }
                }

                cache.assert_invariants();
                prop_assert!(cache.len() <= capacity);
                prop_assert!(cache.queue_len() <= COMPACT_FACTOR * capacity);
            }
        }

        /// The most recently touched key is never the one evicted
        #[test]
        fn prop_last_touched_is_resident(
            capacity in 1..6usize,
            keys in proptest::collection::vec(1..20u8, 1..100),
        ) {
            let mut cache = BoundedCache::new(capacity, |key: &u8| Ok::<_, ()>(*key)).unwrap();
            for key in keys {
                prop_assert_eq!(cache.get_or_compute(key), Ok(key));
                prop_assert!(cache.contains(&key));
            }
        }
    }
}

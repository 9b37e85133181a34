//! Counters shared between a cache and whoever reports on it
//!
//! All counters use relaxed ordering: they are read for reporting only and
//! never synchronize cache state.

use std::sync::atomic::{AtomicU64, Ordering};

/// Running totals for one cache
///
/// A hit is a `get_or_compute` served without calling the factory; a miss is
/// one that called it (including calls whose factory failed). `put` counts as
/// an insert, never as a miss.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    inserts: AtomicU64,
    compactions: AtomicU64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// One entry pushed out by the capacity bound (not `remove` or `clear`)
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// One pass collapsing the access queue to a single touch per key
    pub fn record_compaction(&self) {
        self.compactions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    pub fn inserts(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }

    pub fn compactions(&self) -> u64 {
        self.compactions.load(Ordering::Relaxed)
    }

    /// Share of lookups answered from the cache; 0.0 before any lookup
    pub fn hit_ratio(&self) -> f64 {
        match self.hits() + self.misses() {
            0 => 0.0,
            lookups => self.hits() as f64 / lookups as f64,
        }
    }

    /// Zero every counter
    ///
    /// Not atomic as a whole; a concurrent lookup may land on either side.
    pub fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.evictions,
            &self.inserts,
            &self.compactions,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

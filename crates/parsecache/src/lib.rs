//! # parsecache
//!
//! Bounded get-or-compute cache for expensive-to-build values such as parsed
//! translation files.
//!
//! ## Architecture
//! - **HashMap**: AHash keyed storage of the cached values
//! - **Touch queue**: every access is appended; eviction pops from the front
//! - **Refcounts**: number of queued touches per key, so an entry is only
//!   dropped once its most recent touch reaches the front
//! - **Compaction**: the queue is collapsed to one touch per key once it grows
//!   past four times the capacity
//!
//! Eviction order approximates LRU: an older duplicate touch can outlive a
//! newer touch of another key until compaction retires it.
//!
//! ```
//! use parsecache::BoundedCache;
//!
//! let mut cache = BoundedCache::new(2, |key: &String| Ok::<_, String>(key.to_uppercase())).unwrap();
//! cache.get_or_compute("a".to_string()).unwrap();
//! cache.get_or_compute("b".to_string()).unwrap();
//! cache.get_or_compute("c".to_string()).unwrap();
//!
//! assert!(!cache.contains(&"a".to_string()));
//! assert_eq!(cache.len(), 2);
//! ```

#![warn(missing_docs)]

mod cache;
mod error;
mod lru;
mod stats;

pub use cache::SharedCache;
pub use error::{Error, Result};
pub use lru::BoundedCache;
pub use stats::CacheStats;

//! ParsePool: bounded pool of parsed translation files
//!
//! Files are keyed by canonical path. A cached file whose modification time
//! no longer matches the disk is parsed again and replaces the stale entry.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use parsecache::{CacheStats, SharedCache};
use tracing::debug;

use crate::error::{Error, Result};
use crate::file::TranslationFile;
use crate::unit::FileTotals;

type Loader = fn(&PathBuf) -> Result<Arc<TranslationFile>>;

fn load(path: &PathBuf) -> Result<Arc<TranslationFile>> {
    debug!(path = %path.display(), "parsing translation file");
    TranslationFile::open(path).map(Arc::new)
}

/// Bounded pool of parsed files
///
/// Cloning the pool yields another handle to the same cache.
#[derive(Clone)]
pub struct ParsePool {
    cache: SharedCache<PathBuf, Arc<TranslationFile>, Loader>,
}

impl ParsePool {
    /// Create a pool holding at most `capacity` parsed files
    pub fn new(capacity: usize) -> Result<Self> {
        let cache = SharedCache::new(capacity, load as Loader)?;
        Ok(Self { cache })
    }

    /// Get the parsed file at `path`, parsing it on a miss or when it changed
    ///
    /// A file that has disappeared from disk is dropped from the pool.
    /// Threads that see the same stale mtime may each reparse; the last
    /// `put` wins.
    pub fn get<P: AsRef<Path>>(&self, path: P) -> Result<Arc<TranslationFile>> {
        let path = path.as_ref();
        let key = match canonical(path) {
            Ok(key) => key,
            Err(e @ Error::NotFound(_)) => {
                if self.cache.remove(&pool_key(path)).is_some() {
                    debug!(path = %path.display(), "translation file removed from disk");
                }
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        let file = self.cache.get_or_compute(key.clone())?;

        let modified = fs::metadata(&key)
            .map_err(|e| Error::from(e).in_file(&key))?
            .modified()
            .ok();
        if modified == file.modified() {
            return Ok(file);
        }

        debug!(path = %key.display(), "translation file changed on disk");
        match TranslationFile::open(&key) {
            Ok(fresh) => {
                let fresh = Arc::new(fresh);
                self.cache.put(key, Arc::clone(&fresh));
                Ok(fresh)
            }
            Err(e) => {
                // A failed reparse must not leave the old parse behind
                self.cache.remove(&key);
                Err(e)
            }
        }
    }

    /// Quick statistics for the file at `path`
    pub fn totals<P: AsRef<Path>>(&self, path: P) -> Result<FileTotals> {
        Ok(self.get(path)?.totals())
    }

    /// Drop the parsed file at `path` from the pool
    ///
    /// Returns whether an entry was removed. Also works for files that were
    /// deleted after being pooled.
    pub fn evict<P: AsRef<Path>>(&self, path: P) -> bool {
        self.cache.remove(&pool_key(path.as_ref())).is_some()
    }

    /// Whether the file at `path` is currently parsed and pooled
    pub fn contains<P: AsRef<Path>>(&self, path: P) -> bool {
        self.cache.contains(&pool_key(path.as_ref()))
    }

    /// Number of pooled files
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if the pool is empty
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Maximum number of pooled files
    pub fn capacity(&self) -> usize {
        self.cache.capacity()
    }

    /// Pool statistics
    pub fn stats(&self) -> &CacheStats {
        self.cache.stats()
    }

    /// Drop every pooled file
    pub fn clear(&self) {
        self.cache.clear();
    }
}

fn canonical(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
        _ => Error::from(e).in_file(path),
    })
}

/// Key a path the way `get` stored it, even once the file is gone
///
/// Falls back to the canonical parent directory joined with the file name.
fn pool_key(path: &Path) -> PathBuf {
    if let Ok(key) = fs::canonicalize(path) {
        return key;
    }
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let resolved = match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => fs::canonicalize(parent).ok().map(|p| p.join(name)),
        _ => None,
    };
    resolved.unwrap_or(absolute)
}

//! Error types for parsecache

use std::fmt;

/// Result type alias for cache construction
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the cache itself
///
/// Failures of the caller's factory are never wrapped in this type; they are
/// handed back to the caller unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A cache must be able to hold at least one entry
    ZeroCapacity,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ZeroCapacity => write!(f, "Cache capacity must be at least 1"),
        }
    }
}

impl std::error::Error for Error {}

//! Error types for postore

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for postore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for parsing and pooling translation files
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(io::Error),

    /// Malformed PO content at a 1-based line
    Parse {
        /// Line the problem was found on
        line: usize,
        /// What went wrong
        message: String,
    },

    /// File does not exist
    NotFound(PathBuf),

    /// Error while loading a particular file
    File {
        /// File being loaded
        path: PathBuf,
        /// Underlying error
        source: Box<Error>,
    },

    /// Parse pool could not be built
    Cache(parsecache::Error),
}

impl Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }

    /// Attach the file path to a parse or I/O error
    pub(crate) fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Error::NotFound(_) | Error::File { .. } => self,
            other => Error::File {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Parse { line, message } => write!(f, "Parse error at line {}: {}", line, message),
            Error::NotFound(path) => write!(f, "File not found: {}", path.display()),
            Error::File { path, source } => write!(f, "{}: {}", path.display(), source),
            Error::Cache(e) => write!(f, "Parse pool error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::File { source, .. } => Some(source.as_ref()),
            Error::Cache(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<parsecache::Error> for Error {
    fn from(err: parsecache::Error) -> Self {
        Error::Cache(err)
    }
}

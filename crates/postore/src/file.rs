//! Parsed translation file loaded from disk

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use memmap2::Mmap;

use crate::error::{Error, Result};
use crate::parser::parse_bytes;
use crate::unit::{FileTotals, Unit};

/// A parsed PO file together with its totals
#[derive(Debug, Clone)]
pub struct TranslationFile {
    path: PathBuf,
    modified: Option<SystemTime>,
    header: Option<String>,
    units: Vec<Unit>,
    totals: FileTotals,
}

impl TranslationFile {
    /// Memory-map and parse the file at `path`
    ///
    /// # Arguments
    /// * `path` - PO file to read
    ///
    /// # Returns
    /// * `Result<TranslationFile>` - Parse errors carry the file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        Self::load(path).map_err(|e| e.in_file(path))
    }

    fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        let metadata = file.metadata()?;
        let modified = metadata.modified().ok();

        // Zero-length files cannot be mapped
        let document = if metadata.len() == 0 {
            parse_bytes(&[])?
        } else {
            // SAFETY: the map is read-only and dropped before returning; a
            // concurrent truncation by another process is outside our control
            // and at worst yields a parse error or SIGBUS, as for any mmap reader.
            let map = unsafe { Mmap::map(&file)? };
            parse_bytes(&map)?
        };

        let totals = FileTotals::from_units(&document.units);
        Ok(Self {
            path: path.to_path_buf(),
            modified,
            header: document.header,
            units: document.units,
            totals,
        })
    }

    /// Path the file was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Modification time observed when the file was parsed
    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    /// Header entry msgstr, if the file has one
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    /// Translation units in file order
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Quick statistics
    pub fn totals(&self) -> FileTotals {
        self.totals
    }
}

//! File discovery and statistics report

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use postore::{FileTotals, ParsePool};
use serde::Serialize;
use tracing::{info, warn};

/// Expand the given paths into a sorted list of `.po` files
///
/// Directories are walked recursively; files are taken as given.
pub fn collect_po_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk(path, &mut files)?;
        } else if path.exists() {
            files.push(path.clone());
        } else {
            anyhow::bail!("Path not found: {:?}", path);
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).context(format!("Failed to read directory: {:?}", dir))?;

    for entry in entries {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();

        if path.is_dir() {
            walk(&path, files)?;
        } else if path.extension().map_or(false, |ext| ext == "po") {
            files.push(path);
        }
    }
    Ok(())
}

/// Totals for one file
#[derive(Debug, Serialize)]
pub struct FileReport {
    /// File path as given or discovered
    pub path: PathBuf,
    /// Unit and word counts
    pub totals: FileTotals,
}

/// A file that could not be parsed
#[derive(Debug, Serialize)]
pub struct Failure {
    /// File path as given or discovered
    pub path: PathBuf,
    /// Error message
    pub error: String,
}

/// Statistics over a set of files
#[derive(Debug, Default, Serialize)]
pub struct Report {
    /// Per-file totals, in input order
    pub files: Vec<FileReport>,
    /// Files that failed to load
    pub failures: Vec<Failure>,
    /// Sum over every loaded file
    pub summary: FileTotals,
}

impl Report {
    /// Gather totals for `files` through `pool`
    pub fn build(pool: &ParsePool, files: &[PathBuf]) -> Self {
        let mut report = Report::default();

        for path in files {
            match pool.totals(path) {
                Ok(totals) => {
                    report.summary += totals;
                    report.files.push(FileReport {
                        path: path.clone(),
                        totals,
                    });
                }
                Err(e) => {
                    warn!("Skipping {:?}: {}", path, e);
                    report.failures.push(Failure {
                        path: path.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Scanned {} file(s), {} failed, pool {}/{} (hits {}, misses {})",
            files.len(),
            report.failures.len(),
            pool.len(),
            pool.capacity(),
            pool.stats().hits(),
            pool.stats().misses()
        );

        report
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, totals: &FileTotals, label: &str) -> fmt::Result {
    writeln!(
        f,
        "{:>6.1}%  {:>6} {:>6} {:>6}  {:>8} words  {}",
        totals.translated_percent(),
        totals.translated.units,
        totals.fuzzy.units,
        totals.untranslated.units,
        totals.total.source_words,
        label
    )
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "   done  trans  fuzzy  untr     source        file")?;
        for file in &self.files {
            write_row(f, &file.totals, &file.path.display().to_string())?;
        }
        for failure in &self.failures {
            writeln!(f, "  error  {}: {}", failure.path.display(), failure.error)?;
        }
        write_row(f, &self.summary, "TOTAL")
    }
}

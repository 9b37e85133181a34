//! # postore
//!
//! Gettext PO files parsed into translation units, plus a bounded pool that
//! keeps the most recently used parsed files in memory.
//!
//! ## Layout
//! - `parser`: nom line classifier and unit assembly
//! - `unit`: unit states, word counts and per-file totals
//! - `file`: memory-mapped loading of a single file
//! - `pool`: `ParsePool`, a `parsecache::SharedCache` of parsed files

#![warn(missing_docs)]

mod error;
mod file;
mod parser;
mod pool;
mod unit;

pub use error::{Error, Result};
pub use file::TranslationFile;
pub use parser::{parse_bytes, parse_document, PoDocument};
pub use pool::ParsePool;
pub use unit::{word_count, FileTotals, StateTotals, Unit, UnitState};

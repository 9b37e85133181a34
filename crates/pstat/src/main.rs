//! pstat - translation statistics for PO files
//!
//! Every file goes through a bounded parse pool, so repeated passes over a
//! tree reuse parsed files up to the pool size.

mod report;

use anyhow::{Context, Result};
use clap::Parser;
use postore::ParsePool;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::report::{collect_po_files, Report};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// PO files or directories to scan
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Parse pool size (number of parsed files kept in memory)
    #[arg(short, long, env = "PSTAT_POOL_SIZE", default_value_t = 40)]
    pool_size: usize,

    /// Number of passes over the files
    #[arg(long, default_value_t = 1)]
    passes: usize,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    // Initialize tracing; stdout is reserved for the report
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    info!("pstat v{}", env!("CARGO_PKG_VERSION"));
    info!("Parse pool size: {}", args.pool_size);

    let pool = ParsePool::new(args.pool_size).context("Failed to create parse pool")?;
    let files = collect_po_files(&args.paths)?;
    if files.is_empty() {
        warn!("No .po files found");
    }

    let mut report = Report::default();
    for pass in 1..=args.passes.max(1) {
        info!("Pass {}", pass);
        report = Report::build(&pool, &files);
    }

    let stats = pool.stats();
    info!(
        "Pool: {} hits, {} misses, {} evictions, {} compactions, hit ratio {:.2}",
        stats.hits(),
        stats.misses(),
        stats.evictions(),
        stats.compactions(),
        stats.hit_ratio()
    );

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    } else {
        print!("{}", report);
    }

    if !report.failures.is_empty() {
        anyhow::bail!("{} file(s) could not be parsed", report.failures.len());
    }
    Ok(())
}

//! Cache namespace maintenance commands.

use clap::Subcommand;
use std::path::PathBuf;

use fetchlayer::cache::{
    clear_namespace, format_size, namespace_stats, sweep_namespace, CacheConfig,
};

use crate::error::CliError;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show namespace statistics (files, size, expired records)
    Stats {
        /// Namespace directory (defaults to the standard cache location)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Remove expired and unparseable records
    Sweep {
        /// Namespace directory (defaults to the standard cache location)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Remove every record from the namespace
    Clear {
        /// Namespace directory (defaults to the standard cache location)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

/// Run a cache subcommand.
pub fn run(action: CacheAction) -> Result<(), CliError> {
    match action {
        CacheAction::Stats { dir } => {
            let dir = resolve_dir(dir);
            println!("Cache namespace: {}", dir.display());

            match namespace_stats(&dir) {
                Ok(stats) => {
                    println!("  Records: {}", stats.files);
                    println!("  Size:    {}", format_size(stats.bytes));
                    println!("  Expired: {}", stats.expired);
                    Ok(())
                }
                Err(e) => Err(CliError::Stats(e.to_string())),
            }
        }
        CacheAction::Sweep { dir } => {
            let dir = resolve_dir(dir);
            println!("Sweeping cache namespace: {}", dir.display());

            match sweep_namespace(&dir) {
                Ok(report) => {
                    if report.files_deleted == 0 {
                        println!("Nothing to sweep.");
                    } else {
                        println!(
                            "Removed {} expired records, freed {}",
                            report.files_deleted,
                            format_size(report.bytes_freed)
                        );
                    }
                    Ok(())
                }
                Err(e) => Err(CliError::Sweep(e.to_string())),
            }
        }
        CacheAction::Clear { dir } => {
            let dir = resolve_dir(dir);
            println!("Clearing cache namespace: {}", dir.display());

            match clear_namespace(&dir) {
                Ok(report) => {
                    println!(
                        "Deleted {} records, freed {}",
                        report.files_deleted,
                        format_size(report.bytes_freed)
                    );
                    Ok(())
                }
                Err(e) => Err(CliError::Clear(e.to_string())),
            }
        }
    }
}

fn resolve_dir(dir: Option<PathBuf>) -> PathBuf {
    dir.unwrap_or_else(|| CacheConfig::default().persist_dir)
}

//! Fetchlayer CLI - maintenance for the persistent cache namespace.
//!
//! This binary inspects and prunes the on-disk namespace that backs the
//! persistent cache tier, without requiring the owning application to run.

use clap::{Parser, Subcommand};

mod commands;
mod error;

#[derive(Parser)]
#[command(name = "fetchlayer")]
#[command(version = fetchlayer::VERSION)]
#[command(about = "Maintain the fetchlayer persistent cache namespace", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Cache namespace maintenance (stats, sweep, clear)
    Cache {
        #[command(subcommand)]
        action: commands::cache::CacheAction,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Cache { action } => commands::cache::run(action),
    };

    if let Err(error) = result {
        error.exit();
    }
}

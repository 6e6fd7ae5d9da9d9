//! CLI error handling with user-friendly messages.

use std::fmt;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to read namespace statistics
    Stats(String),
    /// Failed to sweep expired records
    Sweep(String),
    /// Failed to clear the namespace
    Clear(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if matches!(self, CliError::Stats(_)) {
            eprintln!();
            eprintln!("If the namespace directory does not exist yet, the owning");
            eprintln!("application may simply never have persisted anything.");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Stats(msg) => write!(f, "failed to read cache stats: {}", msg),
            CliError::Sweep(msg) => write!(f, "failed to sweep cache: {}", msg),
            CliError::Clear(msg) => write!(f, "failed to clear cache: {}", msg),
        }
    }
}

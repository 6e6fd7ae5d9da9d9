//! Logging setup for fetchlayer applications.
//!
//! Structured `tracing` output to a log file plus the console:
//! - file output is non-blocking and ANSI-free, for tailing and bug reports
//! - console output is compact and colored
//! - filtering via `RUST_LOG`, defaulting to `info`

use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the non-blocking file writer alive.
///
/// Dropping the guard flushes and closes the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the global tracing subscriber.
///
/// Creates `log_dir` if needed and truncates any previous log file so each
/// session starts clean.
///
/// # Arguments
///
/// * `log_dir` - Directory for log files (e.g. "logs")
/// * `log_file` - Log filename (e.g. "fetchlayer.log")
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or the previous
/// log file cannot be truncated.
pub fn init_logging(log_dir: &str, log_file: &str) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(log_dir)?;
    fs::write(Path::new(log_dir).join(log_file), "")?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true)
        .compact();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_logging_creates_log_file() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("logs");
        let dir_str = dir.to_str().unwrap();

        // The global subscriber may already be set by another test; only
        // the filesystem effects are asserted here.
        let _ = init_logging(dir_str, "test.log");

        assert!(dir.join("test.log").exists());
    }
}

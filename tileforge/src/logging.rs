//! Logging infrastructure for TileForge.
//!
//! Writes compact records to `{log_dir}/tileforge.log` (truncated at startup)
//! and to stderr. `RUST_LOG` overrides the configured default filter.

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Log file name inside the log directory.
pub const LOG_FILE_NAME: &str = "tileforge.log";

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard flushes and closes the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the global subscriber.
///
/// `default_filter` applies when `RUST_LOG` is unset or unparseable. Console
/// output goes to stderr so tile bytes written to stdout stay clean.
pub fn init_logging(log_dir: &Path, default_filter: &str) -> Result<LoggingGuard, io::Error> {
    prepare_log_file(log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact();

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Creates the log directory and truncates the previous session's file.
fn prepare_log_file(log_dir: &Path) -> Result<(), io::Error> {
    fs::create_dir_all(log_dir)?;
    fs::write(log_dir.join(LOG_FILE_NAME), "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_creates_directory_and_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let log_dir = temp.path().join("nested").join("logs");

        prepare_log_file(&log_dir).unwrap();

        let log_path = log_dir.join(LOG_FILE_NAME);
        assert!(log_path.exists());
        assert_eq!(fs::read_to_string(&log_path).unwrap(), "");
    }

    #[test]
    fn test_prepare_clears_existing_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let log_path = temp.path().join(LOG_FILE_NAME);
        fs::write(&log_path, "old session").unwrap();

        prepare_log_file(temp.path()).unwrap();

        assert_eq!(fs::read_to_string(&log_path).unwrap(), "");
    }
}

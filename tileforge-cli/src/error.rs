//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use tileforge::app::AppError;
use tileforge::config::ConfigFileError;
use tileforge::service::{ServiceError, STATUS_BAD_GATEWAY};

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Configuration error
    Config(ConfigFileError),
    /// Failed to start the application
    Startup(AppError),
    /// Failed to create the async runtime
    Runtime(std::io::Error),
    /// Status or purge failed
    Service(ServiceError),
    /// The tile request returned a non-success status
    Request { status: u16, message: String },
    /// Failed to write output
    FileWrite { path: String, error: std::io::Error },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Check the configuration file, or print the effective settings with:");
                eprintln!("  tileforge config show");
            }
            CliError::Request { status, .. } if *status == STATUS_BAD_GATEWAY => {
                eprintln!();
                eprintln!("The origin rejected or failed the request. For imagery, make sure:");
                eprintln!("  1. api_key is set in the [imagery] section");
                eprintln!("  2. url_template points at your provider");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(e) => write!(f, "{}", e),
            CliError::Startup(e) => write!(f, "Failed to start: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to create Tokio runtime: {}", e),
            CliError::Service(e) => write!(f, "{}", e),
            CliError::Request { status, message } => {
                write!(f, "Request failed with status {}: {}", status, message)
            }
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path, error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Config(e) => Some(e),
            CliError::Startup(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Service(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            CliError::Request { .. } => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::Startup(e)
    }
}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::Service(e)
    }
}

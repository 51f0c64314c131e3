//! Application error types.

use thiserror::Error;

use crate::config::ConfigFileError;
use crate::index::IndexError;
use crate::origin::HttpError;
use crate::store::StoreError;

/// Errors that can occur while assembling the application.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigFileError),

    /// The object store could not be prepared.
    #[error("Failed to prepare object store: {0}")]
    Store(#[from] StoreError),

    /// The tile index could not be opened or seeded.
    #[error("Failed to open tile index: {0}")]
    Index(#[from] IndexError),

    /// The HTTP client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[from] HttpError),
}

//! Error types for the annotation engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the annotation engine
#[derive(Error, Debug)]
pub enum Error {
    /// No live page/document context is available for capture
    #[error("No document context available: {0}")]
    EnvironmentUnavailable(String),

    /// Failed to allocate or draw into a raster surface
    #[error("Raster operation failed: {0}")]
    RasterError(String),

    /// Failed to mount the overlay toolbar
    #[error("Toolbar mount failed: {0}")]
    MountError(String),

    /// Persistence read/write failure
    #[error("Storage operation failed: {0}")]
    StorageError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

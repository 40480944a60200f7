//! Common error types for TACIT

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for TACIT operations
pub type Result<T> = std::result::Result<T, Error>;

/// Startup errors shared by the TACIT crates
///
/// Every variant is fatal: the service refuses to start rather than serve a
/// partial dataset.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error (wraps csv::Error)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Dataset file does not exist
    #[error("Dataset not found at {}", .0.display())]
    MissingFile(PathBuf),

    /// Dataset file lacks a required column
    #[error("Dataset {} must contain a '{column}' column", .path.display())]
    MissingColumn { path: PathBuf, column: String },
}

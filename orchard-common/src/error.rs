//! Common error types for Orchard

use thiserror::Error;

use crate::analysis::AnalysisError;

/// Common result type for Orchard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Orchard services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Analysis engine error (bad payload, bad summary code, ...)
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),
}

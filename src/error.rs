//! Top-level error types for msixforge.
//!
//! This module defines the error surface seen by the binary and by library
//! consumers; stage-level failure detail lives in [`crate::pipeline::error`].

use thiserror::Error;

/// Result type alias for top-level operations
pub type Result<T> = std::result::Result<T, ForgeError>;

/// Main error type for all msixforge operations
#[derive(Error, Debug)]
pub enum ForgeError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Pipeline errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] crate::pipeline::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

//! Core error types

use thiserror::Error;

/// Core error type for Proxima
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unrecognized security level name
    #[error("Unknown security level: {0}")]
    UnknownSecurityLevel(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

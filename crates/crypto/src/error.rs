//! Error types for cryptographic operations.

use thiserror::Error;

/// Errors raised by key derivation, score encryption and attestation.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Malformed factor, score or metric input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Key derivation failed
    #[error("Key derivation failed: {0}")]
    Derivation(String),

    /// Authenticated encryption failed
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Authenticated decryption failed (tag mismatch, wrong key, malformed envelope)
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// Malformed key or signature input
    #[error("Signature error: {0}")]
    Signature(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

//! Error types for trust registry operations.

use proxima_crypto::CryptoError;
use std::fmt;
use thiserror::Error;

/// Kind of entity a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Participant,
    ServiceProvider,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Participant => f.write_str("Participant"),
            EntityKind::ServiceProvider => f.write_str("Service provider"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Malformed registration or metric input
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("Already registered: {id}")]
    AlreadyRegistered { id: String },

    /// Factor check failed; trust score unchanged
    #[error("Authentication failed for {participant_id}: {reason}")]
    Authentication {
        participant_id: String,
        reason: String,
    },

    /// Trust score below the access threshold
    #[error("Insufficient trust: required {required:.2}, actual {actual:.2}")]
    InsufficientTrust { required: f64, actual: f64 },

    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),

    /// Repository rejected a write
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Blocking crypto task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(String),
}

impl RegistryError {
    pub(crate) fn participant_not_found(id: &str) -> Self {
        RegistryError::NotFound {
            kind: EntityKind::Participant,
            id: id.to_string(),
        }
    }

    pub(crate) fn provider_not_found(id: &str) -> Self {
        RegistryError::NotFound {
            kind: EntityKind::ServiceProvider,
            id: id.to_string(),
        }
    }

    pub(crate) fn authentication(participant_id: &str, reason: impl Into<String>) -> Self {
        RegistryError::Authentication {
            participant_id: participant_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

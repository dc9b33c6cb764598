//! Trust Mesh
//!
//! Trust-scored access control for mesh participants:
//! - Weighted influence and participant trust scoring
//! - Participant and service-provider registry with tiered access gates
//! - Three-factor authentication against enrolled credential commitments
//! - Append-only, filterable audit trail
//! - Async shared registry and score attestation pipeline
//!
//! Persistence is delegated through [`RegistryRepository`].

pub mod audit;
pub mod credential;
pub mod error;
pub mod node;
pub mod registry;
pub mod repository;
pub mod scoring;
pub mod service;

pub use audit::{AuditAction, AuditEntry, AuditFilter, AuditLog};
pub use credential::CredentialCommitment;
pub use error::{EntityKind, RegistryError, RegistryResult};
pub use node::{MeshNode, NodeStatus, ParticipantRegistration, ProviderRegistration, ServiceProvider};
pub use registry::{AccessGrant, AuthenticationChallenge, NetworkStatus, TrustRegistry};
pub use repository::{InMemoryRepository, NullRepository, RegistryRepository};
pub use scoring::{
    calculate_influence_score, calculate_participant_trust, clamp_unit, validate_score,
    InfluenceMetrics, InfluenceWeights, ParticipantMetrics, ParticipantWeights, ScoringEngine,
};
pub use service::{AttestedScore, ScoreAttestationPipeline, SharedTrustRegistry};

pub use proxima_core::SecurityLevel;

//! Participants and service providers of the trust mesh.

use crate::credential::CredentialCommitment;
use crate::error::{RegistryError, RegistryResult};
use crate::scoring::{clamp_unit, ParticipantMetrics};
use proxima_core::SecurityLevel;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a mesh node. Nodes are never removed or revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    Active,
}

/// A registered participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshNode {
    pub id: String,
    pub node_type: String,
    pub location: String,
    /// Always within [0, 1]
    pub trust_score: f64,
    pub services: Vec<String>,
    pub security_level: SecurityLevel,
    pub status: NodeStatus,
    /// Unix milliseconds
    pub registered_at: u64,
    pub last_authenticated: Option<u64>,
}

impl MeshNode {
    /// Add `delta` to the trust score and clamp into [0, 1].
    ///
    /// A NaN delta leaves the score unchanged; infinite deltas saturate.
    pub fn apply_trust_delta(&mut self, delta: f64) -> f64 {
        if !delta.is_nan() {
            self.trust_score = clamp_unit(self.trust_score + delta);
        }
        self.trust_score
    }

    pub fn is_active(&self) -> bool {
        self.status == NodeStatus::Active
    }
}

/// A service that participants request access to. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceProvider {
    pub id: String,
    pub name: String,
    pub provider_type: String,
    pub trust_score: f64,
    pub security_level: SecurityLevel,
    pub services: Vec<String>,
    pub registered_at: u64,
}

/// Input to [`TrustRegistry::register_participant`](crate::TrustRegistry::register_participant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantRegistration {
    pub id: String,
    #[serde(default)]
    pub node_type: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub services: Vec<String>,
    pub security_level: SecurityLevel,
    #[serde(default)]
    pub metrics: ParticipantMetrics,
    /// Commitment checked on authentication. Participants without one
    /// cannot authenticate.
    #[serde(default)]
    pub credential: Option<CredentialCommitment>,
}

impl ParticipantRegistration {
    pub fn new(id: impl Into<String>, security_level: SecurityLevel) -> Self {
        Self {
            id: id.into(),
            node_type: String::new(),
            location: String::new(),
            services: Vec::new(),
            security_level,
            metrics: ParticipantMetrics::default(),
            credential: None,
        }
    }

    pub fn node_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = node_type.into();
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.services = services.into_iter().map(Into::into).collect();
        self
    }

    pub fn metrics(mut self, metrics: ParticipantMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn credential(mut self, credential: CredentialCommitment) -> Self {
        self.credential = Some(credential);
        self
    }

    pub(crate) fn validate(&self) -> RegistryResult<()> {
        if self.id.trim().is_empty() {
            return Err(RegistryError::Validation(
                "participant id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Input to [`TrustRegistry::register_service_provider`](crate::TrustRegistry::register_service_provider).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRegistration {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub provider_type: String,
    pub trust_score: f64,
    pub security_level: SecurityLevel,
    #[serde(default)]
    pub services: Vec<String>,
}

impl ProviderRegistration {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        security_level: SecurityLevel,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            provider_type: String::new(),
            trust_score: 1.0,
            security_level,
            services: Vec::new(),
        }
    }

    pub fn provider_type(mut self, provider_type: impl Into<String>) -> Self {
        self.provider_type = provider_type.into();
        self
    }

    pub fn trust_score(mut self, trust_score: f64) -> Self {
        self.trust_score = trust_score;
        self
    }

    pub fn services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.services = services.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn validate(&self) -> RegistryResult<()> {
        if self.id.trim().is_empty() {
            return Err(RegistryError::Validation(
                "service provider id must not be empty".to_string(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(RegistryError::Validation(
                "service provider name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

//! Trust Registry
//!
//! Owns the participants and service providers of the mesh, authenticates
//! participants against their credential commitments, gates service access
//! by trust threshold, and keeps the append-only audit trail.
//!
//! # Invariants
//!
//! - Trust scores stay within [0, 1] after every update
//! - Failed authentication or access attempts change neither trust scores
//!   nor the audit trail
//! - Audit entries appear in the order the mutations were applied
//!
//! Mutating methods take `&mut self`; wrap the registry in
//! [`SharedTrustRegistry`](crate::SharedTrustRegistry) for concurrent use.

use crate::audit::{AuditAction, AuditEntry, AuditFilter, AuditLog};
use crate::credential::CredentialCommitment;
use crate::error::{RegistryError, RegistryResult};
use crate::node::{
    MeshNode, NodeStatus, ParticipantRegistration, ProviderRegistration, ServiceProvider,
};
use crate::repository::{InMemoryRepository, RegistryRepository};
use crate::scoring::{clamp_unit, ScoringEngine};
use proxima_core::config::DEFAULT_AUTH_SUCCESS_DELTA;
use proxima_core::{Clock, EngineConfig, SecurityLevel, SystemClock};
use proxima_crypto::{FactorSet, KeyDeriver};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Proof that a participant was admitted to a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub grant_id: String,
    pub participant_id: String,
    pub service_id: String,
    pub access_level: SecurityLevel,
    pub trust_score: f64,
    pub required_score: f64,
    pub granted_at: u64,
}

/// Aggregate view of the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStatus {
    pub total_nodes: usize,
    pub total_providers: usize,
    /// Mean participant trust score; 0 when there are no participants
    pub average_trust_score: f64,
    pub audit_entries: usize,
}

/// Everything needed to check a participant's factors without holding the
/// registry. Produced under a read lock; verification runs off-lock.
#[derive(Debug, Clone)]
pub struct AuthenticationChallenge {
    pub participant_id: String,
    pub security_level: SecurityLevel,
    pub credential: Option<CredentialCommitment>,
}

impl AuthenticationChallenge {
    /// Check that the tier's required factors are present and that they
    /// reproduce the enrolled credential.
    pub fn verify(&self, factors: &FactorSet) -> RegistryResult<()> {
        factors
            .validate(self.security_level.auth_factors())
            .map_err(|e| RegistryError::authentication(&self.participant_id, e.to_string()))?;

        let credential = self.credential.as_ref().ok_or_else(|| {
            RegistryError::authentication(&self.participant_id, "no credential enrolled")
        })?;

        if !credential.verify(factors) {
            return Err(RegistryError::authentication(
                &self.participant_id,
                "factors do not match enrolled credential",
            ));
        }
        Ok(())
    }
}

pub struct TrustRegistry<R: RegistryRepository = InMemoryRepository> {
    participants: HashMap<String, MeshNode>,
    credentials: HashMap<String, CredentialCommitment>,
    providers: HashMap<String, ServiceProvider>,
    audit: AuditLog,
    scoring: ScoringEngine,
    deriver: KeyDeriver,
    auth_success_delta: f64,
    clock: Arc<dyn Clock>,
    repository: R,
}

impl TrustRegistry<InMemoryRepository> {
    pub fn new() -> Self {
        Self::with_repository(InMemoryRepository::new())
    }
}

impl Default for TrustRegistry<InMemoryRepository> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RegistryRepository> TrustRegistry<R> {
    pub fn with_repository(repository: R) -> Self {
        Self {
            participants: HashMap::new(),
            credentials: HashMap::new(),
            providers: HashMap::new(),
            audit: AuditLog::new(),
            scoring: ScoringEngine::default(),
            deriver: KeyDeriver::default(),
            auth_success_delta: DEFAULT_AUTH_SUCCESS_DELTA,
            clock: Arc::new(SystemClock),
            repository,
        }
    }

    pub fn from_config(config: &EngineConfig, repository: R) -> RegistryResult<Self> {
        config
            .validate()
            .map_err(|e| RegistryError::Validation(e.to_string()))?;

        let mut registry = Self::with_repository(repository);
        registry.deriver = KeyDeriver::from_config(&config.kdf)?;
        registry.scoring = ScoringEngine::default()
            .with_max_network_size(config.trust.default_max_network_size);
        registry.auth_success_delta = config.trust.auth_success_delta;
        Ok(registry)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_deriver(mut self, deriver: KeyDeriver) -> Self {
        self.deriver = deriver;
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringEngine) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn deriver(&self) -> &KeyDeriver {
        &self.deriver
    }

    /// Enroll `factors` with this registry's KDF parameters.
    pub fn enroll_credential(&self, factors: &FactorSet) -> RegistryResult<CredentialCommitment> {
        Ok(CredentialCommitment::enroll(&self.deriver, factors)?)
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Register a participant, scoring its initial trust from its metrics.
    pub fn register_participant(
        &mut self,
        registration: ParticipantRegistration,
    ) -> RegistryResult<MeshNode> {
        registration.validate()?;
        if self.participants.contains_key(&registration.id) {
            return Err(RegistryError::AlreadyRegistered {
                id: registration.id,
            });
        }
        if let Some(credential) = &registration.credential {
            if !credential.is_well_formed() {
                return Err(RegistryError::Validation(format!(
                    "malformed credential commitment for {}",
                    registration.id
                )));
            }
        }

        let now = self.clock.now_millis();
        let trust_score = self.scoring.participant_trust(&registration.metrics);
        let node = MeshNode {
            id: registration.id,
            node_type: registration.node_type,
            location: registration.location,
            trust_score,
            services: registration.services,
            security_level: registration.security_level,
            status: NodeStatus::Active,
            registered_at: now,
            last_authenticated: None,
        };

        let entry = self.audit.prepare(
            now,
            AuditAction::ParticipantRegistered,
            &node.id,
            json!({
                "node_type": node.node_type,
                "location": node.location,
                "security_level": node.security_level,
                "trust_score": trust_score,
                "credential_enrolled": registration.credential.is_some(),
            }),
        );
        self.repository.commit_participant(&node, &entry)?;
        self.append_audit_entry(entry);

        if let Some(credential) = registration.credential {
            self.credentials.insert(node.id.clone(), credential);
        }
        self.participants.insert(node.id.clone(), node.clone());

        info!(
            participant_id = %node.id,
            security_level = %node.security_level,
            trust_score,
            "Participant registered"
        );
        Ok(node)
    }

    pub fn register_service_provider(
        &mut self,
        registration: ProviderRegistration,
    ) -> RegistryResult<ServiceProvider> {
        registration.validate()?;
        if self.providers.contains_key(&registration.id) {
            return Err(RegistryError::AlreadyRegistered {
                id: registration.id,
            });
        }
        if registration.trust_score.is_nan() {
            return Err(RegistryError::Validation(format!(
                "service provider {} has no trust score",
                registration.id
            )));
        }

        let now = self.clock.now_millis();
        let provider = ServiceProvider {
            id: registration.id,
            name: registration.name,
            provider_type: registration.provider_type,
            trust_score: clamp_unit(registration.trust_score),
            security_level: registration.security_level,
            services: registration.services,
            registered_at: now,
        };

        let entry = self.audit.prepare(
            now,
            AuditAction::ProviderRegistered,
            &provider.id,
            json!({
                "name": provider.name,
                "provider_type": provider.provider_type,
                "security_level": provider.security_level,
                "trust_score": provider.trust_score,
            }),
        );
        self.repository.commit_provider(&provider, &entry)?;
        self.append_audit_entry(entry);
        self.providers.insert(provider.id.clone(), provider.clone());

        info!(
            provider_id = %provider.id,
            security_level = %provider.security_level,
            "Service provider registered"
        );
        Ok(provider)
    }

    /// Verify `factors` against the participant's credential and, on
    /// success, raise its trust score by the configured delta.
    ///
    /// Returns the updated trust score. On failure nothing is changed.
    pub fn authenticate_participant(
        &mut self,
        participant_id: &str,
        factors: &FactorSet,
    ) -> RegistryResult<f64> {
        let challenge = self.authentication_challenge(participant_id)?;
        if let Err(e) = challenge.verify(factors) {
            warn!(
                participant_id = %participant_id,
                security_level = %challenge.security_level,
                error = %e,
                "Authentication failed"
            );
            return Err(e);
        }
        self.record_authentication(participant_id)
    }

    pub(crate) fn authentication_challenge(
        &self,
        participant_id: &str,
    ) -> RegistryResult<AuthenticationChallenge> {
        let node = self
            .participants
            .get(participant_id)
            .ok_or_else(|| RegistryError::participant_not_found(participant_id))?;
        Ok(AuthenticationChallenge {
            participant_id: node.id.clone(),
            security_level: node.security_level,
            credential: self.credentials.get(participant_id).cloned(),
        })
    }

    /// Apply the effects of an already verified authentication.
    pub(crate) fn record_authentication(&mut self, participant_id: &str) -> RegistryResult<f64> {
        let now = self.clock.now_millis();
        let mut node = self
            .participants
            .get(participant_id)
            .cloned()
            .ok_or_else(|| RegistryError::participant_not_found(participant_id))?;

        let previous = node.trust_score;
        let trust_score = node.apply_trust_delta(self.auth_success_delta);
        node.last_authenticated = Some(now);

        let entry = self.audit.prepare(
            now,
            AuditAction::ParticipantAuthenticated,
            participant_id,
            json!({
                "security_level": node.security_level,
                "factors": node.security_level.auth_factors(),
                "previous_score": previous,
                "trust_score": trust_score,
            }),
        );
        self.repository.commit_participant(&node, &entry)?;
        self.append_audit_entry(entry);
        self.participants.insert(node.id.clone(), node);

        info!(
            participant_id = %participant_id,
            previous_score = previous,
            trust_score,
            "Participant authenticated"
        );
        Ok(trust_score)
    }

    /// Add `delta` to a participant's trust score, clamped into [0, 1].
    pub fn update_trust_score(&mut self, participant_id: &str, delta: f64) -> RegistryResult<f64> {
        let now = self.clock.now_millis();
        let mut node = self
            .participants
            .get(participant_id)
            .cloned()
            .ok_or_else(|| RegistryError::participant_not_found(participant_id))?;

        let previous = node.trust_score;
        let trust_score = node.apply_trust_delta(delta);

        let entry = self.audit.prepare(
            now,
            AuditAction::TrustScoreUpdated,
            participant_id,
            json!({
                "delta": delta,
                "previous_score": previous,
                "trust_score": trust_score,
            }),
        );
        self.repository.commit_participant(&node, &entry)?;
        self.append_audit_entry(entry);
        self.participants.insert(node.id.clone(), node);

        debug!(
            participant_id = %participant_id,
            delta,
            previous_score = previous,
            trust_score,
            "Trust score updated"
        );
        Ok(trust_score)
    }

    /// Grant access if the participant's trust meets the threshold of
    /// `access_level`. The comparison is inclusive.
    pub fn access_service(
        &mut self,
        participant_id: &str,
        service_id: &str,
        access_level: SecurityLevel,
    ) -> RegistryResult<AccessGrant> {
        let node = self
            .participants
            .get(participant_id)
            .ok_or_else(|| RegistryError::participant_not_found(participant_id))?;
        if !self.providers.contains_key(service_id) {
            return Err(RegistryError::provider_not_found(service_id));
        }

        let required = access_level.min_trust_score();
        let actual = node.trust_score;
        if actual < required {
            warn!(
                participant_id = %participant_id,
                service_id = %service_id,
                access_level = %access_level,
                required,
                actual,
                "Service access denied"
            );
            return Err(RegistryError::InsufficientTrust { required, actual });
        }

        let now = self.clock.now_millis();
        let grant = AccessGrant {
            grant_id: Uuid::new_v4().to_string(),
            participant_id: participant_id.to_string(),
            service_id: service_id.to_string(),
            access_level,
            trust_score: actual,
            required_score: required,
            granted_at: now,
        };

        let entry = self.audit.prepare(
            now,
            AuditAction::ServiceAccessed,
            participant_id,
            json!({
                "grant_id": grant.grant_id,
                "service_id": service_id,
                "access_level": access_level,
                "trust_score": actual,
                "required_score": required,
            }),
        );
        self.repository.commit_audit(&entry)?;
        self.append_audit_entry(entry);

        info!(
            participant_id = %participant_id,
            service_id = %service_id,
            access_level = %access_level,
            grant_id = %grant.grant_id,
            "Service access granted"
        );
        Ok(grant)
    }

    /// Audit entries matching `filter`, in chronological order.
    pub fn get_audit_trail(&self, filter: &AuditFilter) -> Vec<AuditEntry> {
        self.audit.query(filter)
    }

    pub fn get_network_status(&self) -> NetworkStatus {
        let total_nodes = self.participants.len();
        let average_trust_score = if total_nodes == 0 {
            0.0
        } else {
            self.participants
                .values()
                .map(|node| node.trust_score)
                .sum::<f64>()
                / total_nodes as f64
        };

        NetworkStatus {
            total_nodes,
            total_providers: self.providers.len(),
            average_trust_score,
            audit_entries: self.audit.len(),
        }
    }

    pub fn participant(&self, participant_id: &str) -> Option<&MeshNode> {
        self.participants.get(participant_id)
    }

    pub fn provider(&self, provider_id: &str) -> Option<&ServiceProvider> {
        self.providers.get(provider_id)
    }

    pub fn trust_score(&self, participant_id: &str) -> Option<f64> {
        self.participants.get(participant_id).map(|node| node.trust_score)
    }

    fn append_audit_entry(&mut self, entry: AuditEntry) {
        // prepare/commit both happen under &mut self, so nothing can interleave.
        let committed = self.audit.commit(entry);
        debug_assert!(committed, "audit entry prepared against a stale log");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EntityKind;
    use crate::repository::NullRepository;
    use crate::scoring::ParticipantMetrics;
    use proxima_core::FixedClock;
    use proptest::prelude::*;
    use proxima_crypto::{generate_factor_key, FactorKey};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn fast_deriver() -> KeyDeriver {
        KeyDeriver::with_iterations(1_000)
    }

    fn registry() -> TrustRegistry {
        TrustRegistry::new().with_deriver(fast_deriver())
    }

    fn with_provider(mut registry: TrustRegistry) -> TrustRegistry {
        registry
            .register_service_provider(
                ProviderRegistration::new("svc-1", "Settlement", SecurityLevel::Bank)
                    .services(["payments"]),
            )
            .unwrap();
        registry
    }

    fn enrolled(id: &str, level: SecurityLevel) -> (ParticipantRegistration, FactorSet) {
        let factors = FactorSet::new("p1", "123456", generate_factor_key());
        let credential = CredentialCommitment::enroll(&fast_deriver(), &factors).unwrap();
        (
            ParticipantRegistration::new(id, level).credential(credential),
            factors,
        )
    }

    #[test]
    fn test_zero_metrics_register_with_zero_trust_and_are_denied() {
        let mut registry = with_provider(registry());
        let node = registry
            .register_participant(
                ParticipantRegistration::new("node-1", SecurityLevel::Mesh)
                    .metrics(ParticipantMetrics::default()),
            )
            .unwrap();
        assert_eq!(node.trust_score, 0.0);
        assert_eq!(node.status, NodeStatus::Active);

        let err = registry
            .access_service("node-1", "svc-1", SecurityLevel::Mesh)
            .unwrap_err();
        match err {
            RegistryError::InsufficientTrust { required, actual } => {
                assert_eq!(required, 0.75);
                assert_eq!(actual, 0.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut registry = with_provider(registry());
        registry
            .register_participant(ParticipantRegistration::new("node-1", SecurityLevel::Mesh))
            .unwrap();
        assert_eq!(registry.update_trust_score("node-1", 0.75).unwrap(), 0.75);

        let grant = registry
            .access_service("node-1", "svc-1", SecurityLevel::Mesh)
            .unwrap();
        assert_eq!(grant.required_score, 0.75);
        assert_eq!(grant.trust_score, 0.75);

        let err = registry
            .access_service("node-1", "svc-1", SecurityLevel::Utility)
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::InsufficientTrust { required, actual } if required == 0.85 && actual == 0.75
        ));
    }

    #[test]
    fn test_access_requires_known_participant_and_service() {
        let mut registry = with_provider(registry());
        registry
            .register_participant(ParticipantRegistration::new("node-1", SecurityLevel::Mesh))
            .unwrap();

        assert!(matches!(
            registry.access_service("ghost", "svc-1", SecurityLevel::Mesh),
            Err(RegistryError::NotFound { kind: EntityKind::Participant, .. })
        ));
        assert!(matches!(
            registry.access_service("node-1", "svc-404", SecurityLevel::Mesh),
            Err(RegistryError::NotFound { kind: EntityKind::ServiceProvider, .. })
        ));
    }

    #[test]
    fn test_denied_access_leaves_audit_trail_untouched() {
        let mut registry = with_provider(registry());
        registry
            .register_participant(ParticipantRegistration::new("node-1", SecurityLevel::Mesh))
            .unwrap();
        let before = registry.get_audit_trail(&AuditFilter::all());

        let _ = registry.access_service("node-1", "svc-1", SecurityLevel::Bank);
        assert_eq!(registry.get_audit_trail(&AuditFilter::all()), before);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = registry();
        registry
            .register_participant(ParticipantRegistration::new("node-1", SecurityLevel::Mesh))
            .unwrap();
        assert!(matches!(
            registry.register_participant(ParticipantRegistration::new("node-1", SecurityLevel::Bank)),
            Err(RegistryError::AlreadyRegistered { .. })
        ));
        assert_eq!(registry.get_network_status().total_nodes, 1);
    }

    #[test]
    fn test_authentication_raises_trust_by_delta() {
        let mut registry = registry();
        let (registration, factors) = enrolled("bank-1", SecurityLevel::Bank);
        registry
            .register_participant(registration.metrics(ParticipantMetrics {
                security_compliance: 1.0,
                ..ParticipantMetrics::default()
            }))
            .unwrap();

        let score = registry.authenticate_participant("bank-1", &factors).unwrap();
        assert!((score - 0.35).abs() < 1e-12);
        assert!(registry.participant("bank-1").unwrap().last_authenticated.is_some());

        let authenticated = registry
            .get_audit_trail(&AuditFilter::all().action(AuditAction::ParticipantAuthenticated));
        assert_eq!(authenticated.len(), 1);
    }

    #[test]
    fn test_authentication_clamps_at_one() {
        let mut registry = registry();
        let (registration, factors) = enrolled("bank-1", SecurityLevel::Bank);
        registry.register_participant(registration).unwrap();
        registry.update_trust_score("bank-1", 0.95).unwrap();

        assert_eq!(registry.authenticate_participant("bank-1", &factors).unwrap(), 1.0);
        assert_eq!(registry.authenticate_participant("bank-1", &factors).unwrap(), 1.0);
    }

    #[test]
    fn test_failed_authentication_changes_nothing() {
        let mut registry = registry();
        let (registration, factors) = enrolled("bank-1", SecurityLevel::Bank);
        registry.register_participant(registration).unwrap();
        let trail_before = registry.get_audit_trail(&AuditFilter::all());

        let mut wrong = factors.clone();
        wrong.password = "p2".to_string();
        assert!(matches!(
            registry.authenticate_participant("bank-1", &wrong),
            Err(RegistryError::Authentication { .. })
        ));

        assert_eq!(registry.trust_score("bank-1"), Some(0.0));
        assert_eq!(registry.get_audit_trail(&AuditFilter::all()), trail_before);
    }

    #[test]
    fn test_bank_tier_requires_device_factor() {
        let mut registry = registry();
        let factors = FactorSet::new("p1", "123456", FactorKey::from_bytes([0u8; 32]));
        let credential = CredentialCommitment::enroll(&fast_deriver(), &factors).unwrap();
        registry
            .register_participant(
                ParticipantRegistration::new("bank-1", SecurityLevel::Bank).credential(credential.clone()),
            )
            .unwrap();
        registry
            .register_participant(
                ParticipantRegistration::new("util-1", SecurityLevel::Utility).credential(credential),
            )
            .unwrap();

        // Same commitment, but only the bank tier insists on a device key.
        assert!(registry.authenticate_participant("bank-1", &factors).is_err());
        assert!(registry.authenticate_participant("util-1", &factors).is_ok());
    }

    #[test]
    fn test_authentication_without_credential_fails() {
        let mut registry = registry();
        registry
            .register_participant(ParticipantRegistration::new("mesh-1", SecurityLevel::Mesh))
            .unwrap();
        let factors = FactorSet::new("p1", "123456", generate_factor_key());

        let err = registry.authenticate_participant("mesh-1", &factors).unwrap_err();
        assert!(matches!(err, RegistryError::Authentication { .. }));
        assert!(matches!(
            registry.authenticate_participant("ghost", &factors),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_malformed_credential_rejected_at_registration() {
        let mut registry = registry();
        let bad = CredentialCommitment::from_parts(vec![1u8; 16], vec![2u8; 3], 1_000);
        assert!(matches!(
            registry.register_participant(
                ParticipantRegistration::new("node-1", SecurityLevel::Bank).credential(bad)
            ),
            Err(RegistryError::Validation(_))
        ));
    }

    #[test]
    fn test_update_trust_score_clamps() {
        let mut registry = registry();
        registry
            .register_participant(ParticipantRegistration::new("node-1", SecurityLevel::Mesh))
            .unwrap();

        assert_eq!(registry.update_trust_score("node-1", 42.0).unwrap(), 1.0);
        assert_eq!(registry.update_trust_score("node-1", -0.25).unwrap(), 0.75);
        assert_eq!(registry.update_trust_score("node-1", -1e9).unwrap(), 0.0);
        assert_eq!(registry.update_trust_score("node-1", f64::NAN).unwrap(), 0.0);
        assert!(registry.update_trust_score("ghost", 0.1).is_err());
    }

    #[test]
    fn test_network_status() {
        let mut registry = with_provider(registry());
        assert_eq!(registry.get_network_status().average_trust_score, 0.0);

        registry
            .register_participant(ParticipantRegistration::new("a", SecurityLevel::Mesh))
            .unwrap();
        registry
            .register_participant(ParticipantRegistration::new("b", SecurityLevel::Mesh))
            .unwrap();
        registry.update_trust_score("a", 0.5).unwrap();

        let status = registry.get_network_status();
        assert_eq!(status.total_nodes, 2);
        assert_eq!(status.total_providers, 1);
        assert!((status.average_trust_score - 0.25).abs() < 1e-12);
        assert_eq!(status.audit_entries, 4);
    }

    #[test]
    fn test_audit_date_range_with_fixed_clock() {
        let clock = FixedClock::new(1_000);
        let mut registry = registry().with_clock(Arc::new(clock.clone()));

        registry
            .register_participant(ParticipantRegistration::new("a", SecurityLevel::Mesh))
            .unwrap();
        clock.advance(Duration::from_secs(60));
        registry
            .register_participant(ParticipantRegistration::new("b", SecurityLevel::Mesh))
            .unwrap();
        clock.advance(Duration::from_secs(60));
        registry.update_trust_score("a", 0.2).unwrap();

        let late = registry.get_audit_trail(&AuditFilter::all().since(61_000));
        assert_eq!(
            late.iter().map(|e| e.participant_id.as_str()).collect::<Vec<_>>(),
            vec!["b", "a"]
        );

        let only_a = registry.get_audit_trail(&AuditFilter::all().participant("a"));
        assert_eq!(
            only_a.iter().map(|e| e.action).collect::<Vec<_>>(),
            vec![AuditAction::ParticipantRegistered, AuditAction::TrustScoreUpdated]
        );
    }

    #[test]
    fn test_repository_receives_every_committed_change() {
        let mut registry = with_provider(registry());
        registry
            .register_participant(ParticipantRegistration::new("node-1", SecurityLevel::Mesh))
            .unwrap();
        registry.update_trust_score("node-1", 0.8).unwrap();
        registry
            .access_service("node-1", "svc-1", SecurityLevel::Mesh)
            .unwrap();

        let repo = registry.repository();
        assert_eq!(repo.participant("node-1").unwrap().trust_score, 0.8);
        assert!(repo.provider("svc-1").is_some());
        assert_eq!(repo.audit_entries(), registry.get_audit_trail(&AuditFilter::all()).as_slice());
    }

    /// In-memory store whose audit log can be taken offline. Each commit
    /// checks availability before touching anything, so a refused write
    /// persists neither the record nor the entry.
    struct AuditOutageRepository {
        inner: InMemoryRepository,
        audit_down: Arc<AtomicBool>,
    }

    impl AuditOutageRepository {
        fn new(audit_down: Arc<AtomicBool>) -> Self {
            Self {
                inner: InMemoryRepository::new(),
                audit_down,
            }
        }

        fn check_audit(&self) -> RegistryResult<()> {
            if self.audit_down.load(Ordering::SeqCst) {
                return Err(RegistryError::Persistence("audit store unavailable".to_string()));
            }
            Ok(())
        }
    }

    impl RegistryRepository for AuditOutageRepository {
        fn commit_participant(&mut self, node: &MeshNode, entry: &AuditEntry) -> RegistryResult<()> {
            self.check_audit()?;
            self.inner.commit_participant(node, entry)
        }

        fn commit_provider(
            &mut self,
            provider: &ServiceProvider,
            entry: &AuditEntry,
        ) -> RegistryResult<()> {
            self.check_audit()?;
            self.inner.commit_provider(provider, entry)
        }

        fn commit_audit(&mut self, entry: &AuditEntry) -> RegistryResult<()> {
            self.check_audit()?;
            self.inner.commit_audit(entry)
        }
    }

    #[test]
    fn test_audit_outage_keeps_store_and_registry_in_step() {
        let audit_down = Arc::new(AtomicBool::new(false));
        let mut registry = TrustRegistry::with_repository(AuditOutageRepository::new(
            Arc::clone(&audit_down),
        ))
        .with_deriver(fast_deriver());
        registry
            .register_service_provider(ProviderRegistration::new("svc-1", "Relay", SecurityLevel::Mesh))
            .unwrap();
        let (registration, factors) = enrolled("node-1", SecurityLevel::Utility);
        registry.register_participant(registration).unwrap();
        registry.update_trust_score("node-1", 0.8).unwrap();

        audit_down.store(true, Ordering::SeqCst);

        assert!(matches!(
            registry.register_participant(ParticipantRegistration::new("node-2", SecurityLevel::Mesh)),
            Err(RegistryError::Persistence(_))
        ));
        assert!(matches!(
            registry.update_trust_score("node-1", 0.1),
            Err(RegistryError::Persistence(_))
        ));
        assert!(matches!(
            registry.authenticate_participant("node-1", &factors),
            Err(RegistryError::Persistence(_))
        ));
        assert!(matches!(
            registry.access_service("node-1", "svc-1", SecurityLevel::Mesh),
            Err(RegistryError::Persistence(_))
        ));

        let stored = registry.repository().inner.participant("node-1").unwrap();
        assert_eq!(stored.trust_score, 0.8);
        assert_eq!(stored.last_authenticated, None);
        assert_eq!(registry.trust_score("node-1"), Some(0.8));
        assert!(registry.participant("node-2").is_none());
        assert!(registry.repository().inner.participant("node-2").is_none());
        assert_eq!(
            registry.repository().inner.audit_entries(),
            registry.get_audit_trail(&AuditFilter::all()).as_slice()
        );

        audit_down.store(false, Ordering::SeqCst);
        let score = registry.authenticate_participant("node-1", &factors).unwrap();
        assert!((score - 0.9).abs() < 1e-12);
        assert_eq!(registry.repository().inner.participant("node-1").unwrap().trust_score, score);
    }

    #[test]
    fn test_credentials_survive_iteration_count_change() {
        let (registration, factors) = enrolled("util-1", SecurityLevel::Utility);

        let mut config = EngineConfig::default();
        config.kdf.iterations = 2_000;
        let mut registry = TrustRegistry::from_config(&config, NullRepository).unwrap();
        registry.register_participant(registration).unwrap();

        assert!(registry.authenticate_participant("util-1", &factors).is_ok());

        let fresh = registry.enroll_credential(&factors).unwrap();
        assert_eq!(fresh.iterations(), 2_000);
        assert!(fresh.verify(&factors));
    }

    #[test]
    fn test_from_config_sets_network_ceiling() {
        let mut config = EngineConfig::default();
        config.trust.default_max_network_size = 2_500;
        let mut registry = TrustRegistry::from_config(&config, NullRepository).unwrap();

        let node = registry
            .register_participant(
                ParticipantRegistration::new("node-1", SecurityLevel::Mesh).metrics(
                    ParticipantMetrics {
                        network_size: 2_500,
                        ..ParticipantMetrics::default()
                    },
                ),
            )
            .unwrap();
        assert!((node.trust_score - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_from_config_applies_delta() {
        let mut config = EngineConfig::default();
        config.kdf.iterations = 1_000;
        config.trust.auth_success_delta = 0.25;

        let mut registry = TrustRegistry::from_config(&config, NullRepository).unwrap();
        let (registration, factors) = enrolled("util-1", SecurityLevel::Utility);
        registry.register_participant(registration).unwrap();

        assert_eq!(registry.authenticate_participant("util-1", &factors).unwrap(), 0.25);
    }

    #[test]
    fn test_provider_trust_is_clamped() {
        let mut registry = registry();
        let provider = registry
            .register_service_provider(
                ProviderRegistration::new("svc-1", "Grid", SecurityLevel::Utility).trust_score(3.0),
            )
            .unwrap();
        assert_eq!(provider.trust_score, 1.0);
        assert!(registry
            .register_service_provider(
                ProviderRegistration::new("svc-2", "Grid", SecurityLevel::Utility)
                    .trust_score(f64::NAN),
            )
            .is_err());
    }

    proptest! {
        #[test]
        fn prop_trust_updates_stay_in_unit_interval(
            deltas in proptest::collection::vec(any::<f64>(), 1..32)
        ) {
            let mut registry = TrustRegistry::with_repository(NullRepository);
            registry
                .register_participant(ParticipantRegistration::new("node-1", SecurityLevel::Mesh))
                .unwrap();

            for delta in deltas {
                let score = registry.update_trust_score("node-1", delta).unwrap();
                prop_assert!((0.0..=1.0).contains(&score));
                prop_assert_eq!(registry.trust_score("node-1"), Some(score));
            }
        }
    }
}

//! Trust Mesh Service
//!
//! Async entry points over the registry and the crypto pipeline.
//!
//! [`SharedTrustRegistry`] serializes every mutation on a single write lock,
//! so trust updates are atomic and the audit trail records events in the
//! order they were applied. PBKDF2 and RSA key generation run on the
//! blocking pool and never hold the lock.

use crate::audit::{AuditEntry, AuditFilter};
use crate::error::{RegistryError, RegistryResult};
use crate::node::{MeshNode, ParticipantRegistration, ProviderRegistration, ServiceProvider};
use crate::registry::{AccessGrant, NetworkStatus, TrustRegistry};
use crate::repository::{InMemoryRepository, RegistryRepository};
use crate::scoring::{InfluenceMetrics, ScoringEngine};
use proxima_core::SecurityLevel;
use proxima_crypto::{
    generate_key_pair, AttestationKeyPair, FactorSet, KeyDeriver, Metadata, RsaPublicKey,
    ScoreCipher, ScorePayload, SignedEnvelope,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};

fn join_error(e: tokio::task::JoinError) -> RegistryError {
    RegistryError::Task(e.to_string())
}

/// Cloneable handle to a registry shared between tasks.
pub struct SharedTrustRegistry<R: RegistryRepository = InMemoryRepository> {
    inner: Arc<RwLock<TrustRegistry<R>>>,
}

impl<R: RegistryRepository> Clone for SharedTrustRegistry<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: RegistryRepository + 'static> SharedTrustRegistry<R> {
    pub fn new(registry: TrustRegistry<R>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Read access for queries that span several calls.
    pub async fn read(&self) -> RwLockReadGuard<'_, TrustRegistry<R>> {
        self.inner.read().await
    }

    pub async fn register_participant(
        &self,
        registration: ParticipantRegistration,
    ) -> RegistryResult<MeshNode> {
        self.inner.write().await.register_participant(registration)
    }

    pub async fn register_service_provider(
        &self,
        registration: ProviderRegistration,
    ) -> RegistryResult<ServiceProvider> {
        self.inner
            .write()
            .await
            .register_service_provider(registration)
    }

    /// Authenticate without holding any lock during key derivation.
    ///
    /// The credential is snapshotted under the read lock, verified on the
    /// blocking pool, and the trust delta is applied under the write lock.
    pub async fn authenticate_participant(
        &self,
        participant_id: &str,
        factors: FactorSet,
    ) -> RegistryResult<f64> {
        let challenge = self
            .inner
            .read()
            .await
            .authentication_challenge(participant_id)?;

        let level = challenge.security_level;
        let verified = tokio::task::spawn_blocking(move || challenge.verify(&factors))
            .await
            .map_err(join_error)?;

        if let Err(e) = verified {
            warn!(
                participant_id = %participant_id,
                security_level = %level,
                error = %e,
                "Authentication failed"
            );
            return Err(e);
        }

        self.inner
            .write()
            .await
            .record_authentication(participant_id)
    }

    pub async fn update_trust_score(&self, participant_id: &str, delta: f64) -> RegistryResult<f64> {
        self.inner
            .write()
            .await
            .update_trust_score(participant_id, delta)
    }

    pub async fn access_service(
        &self,
        participant_id: &str,
        service_id: &str,
        access_level: SecurityLevel,
    ) -> RegistryResult<AccessGrant> {
        // Write lock: the grant is appended to the audit trail.
        self.inner
            .write()
            .await
            .access_service(participant_id, service_id, access_level)
    }

    pub async fn get_audit_trail(&self, filter: &AuditFilter) -> Vec<AuditEntry> {
        self.inner.read().await.get_audit_trail(filter)
    }

    pub async fn get_network_status(&self) -> NetworkStatus {
        self.inner.read().await.get_network_status()
    }

    pub async fn trust_score(&self, participant_id: &str) -> Option<f64> {
        self.inner.read().await.trust_score(participant_id)
    }

    pub async fn participant(&self, participant_id: &str) -> Option<MeshNode> {
        self.inner.read().await.participant(participant_id).cloned()
    }
}

/// A score sealed under the participant's master key and signed by the
/// attesting service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttestedScore {
    pub participant_id: String,
    pub score: f64,
    /// KDF salt; the factor holder needs it to re-derive the envelope key
    #[serde(with = "hex_bytes")]
    pub salt: Vec<u8>,
    pub signed: SignedEnvelope,
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

/// Derive → score → encrypt → sign.
pub struct ScoreAttestationPipeline {
    deriver: KeyDeriver,
    scoring: ScoringEngine,
    key_pair: Arc<AttestationKeyPair>,
}

impl ScoreAttestationPipeline {
    /// Build a pipeline with a freshly generated attestation key.
    pub async fn new(deriver: KeyDeriver) -> RegistryResult<Self> {
        let key_pair = tokio::task::spawn_blocking(generate_key_pair)
            .await
            .map_err(join_error)??;
        info!("Score attestation pipeline ready");
        Ok(Self::with_key_pair(deriver, Arc::new(key_pair)))
    }

    pub fn with_key_pair(deriver: KeyDeriver, key_pair: Arc<AttestationKeyPair>) -> Self {
        Self {
            deriver,
            scoring: ScoringEngine::default(),
            key_pair,
        }
    }

    pub fn with_scoring(mut self, scoring: ScoringEngine) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        self.key_pair.public_key()
    }

    pub async fn attest(
        &self,
        participant_id: &str,
        factors: FactorSet,
        metrics: &InfluenceMetrics,
        metadata: Metadata,
    ) -> RegistryResult<AttestedScore> {
        let score = self.scoring.influence_score(metrics);

        let deriver = self.deriver.clone();
        let derived = tokio::task::spawn_blocking(move || deriver.derive_factors(&factors))
            .await
            .map_err(join_error)??;

        let envelope =
            ScoreCipher::new(&derived.master_key).encrypt_score(score, participant_id, metadata)?;
        let signed = self.key_pair.attest(envelope)?;

        debug!(participant_id = %participant_id, score, "Score attested");
        Ok(AttestedScore {
            participant_id: participant_id.to_string(),
            score,
            salt: derived.salt,
            signed,
        })
    }

    /// Check the attestation against this pipeline's signing key.
    pub fn verify(&self, attested: &AttestedScore) -> bool {
        attested.signed.verify(self.key_pair.public_key())
    }

    /// Re-derive the envelope key from `factors` and decrypt.
    pub async fn open(
        &self,
        attested: &AttestedScore,
        factors: FactorSet,
    ) -> RegistryResult<ScorePayload> {
        let deriver = self.deriver.clone();
        let salt = attested.salt.clone();
        let master_key = tokio::task::spawn_blocking(move || {
            deriver.derive_with_salt(&factors.password, &factors.otp, &factors.device_key, &salt)
        })
        .await
        .map_err(join_error)??;

        Ok(ScoreCipher::new(&master_key).decrypt_score(&attested.signed.envelope)?)
    }
}

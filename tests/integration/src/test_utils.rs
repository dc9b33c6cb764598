//! Shared fixtures for the integration suite

use proxima_core::SecurityLevel;
use proxima_crypto::{generate_factor_key, generate_key_pair, AttestationKeyPair, FactorSet, KeyDeriver};
use proxima_trust_mesh::{CredentialCommitment, ParticipantRegistration, ProviderRegistration, TrustRegistry};
use std::sync::{Arc, OnceLock};

/// Iteration count low enough for debug-build tests.
pub const TEST_KDF_ITERATIONS: u32 = 1_000;

pub fn test_deriver() -> KeyDeriver {
    KeyDeriver::with_iterations(TEST_KDF_ITERATIONS)
}

/// RSA key generation is slow; every test in the process shares one key.
pub fn shared_key_pair() -> Arc<AttestationKeyPair> {
    static KEY: OnceLock<Arc<AttestationKeyPair>> = OnceLock::new();
    KEY.get_or_init(|| Arc::new(generate_key_pair().expect("RSA key generation")))
        .clone()
}

pub fn sample_factors() -> FactorSet {
    FactorSet::new("p1", "123456", generate_factor_key())
}

/// Participant registration with an enrolled credential, plus the factors
/// that unlock it.
pub fn enrolled_participant(id: &str, level: SecurityLevel) -> (ParticipantRegistration, FactorSet) {
    let factors = sample_factors();
    let credential =
        CredentialCommitment::enroll(&test_deriver(), &factors).expect("credential enrollment");
    (ParticipantRegistration::new(id, level).credential(credential), factors)
}

/// Registry with one provider per tier: `bank-svc`, `utility-svc`, `mesh-svc`.
pub fn registry_with_providers() -> TrustRegistry {
    let mut registry = TrustRegistry::new().with_deriver(test_deriver());
    for level in SecurityLevel::ALL {
        let id = format!("{}-svc", level.as_str().to_lowercase());
        registry
            .register_service_provider(ProviderRegistration::new(&id, &id, level))
            .expect("provider registration");
    }
    registry
}

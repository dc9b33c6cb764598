//! Credential commitments for three-factor authentication.
//!
//! At enrollment the participant's factors are stretched into a master key
//! under a fresh salt; only the salt, the iteration count and the SHA-256
//! fingerprint of the key are kept. Authentication re-derives with the
//! recorded parameters and compares fingerprints in constant time, so a
//! later change to the configured iteration count only affects new
//! enrollments.

use proxima_core::config::DEFAULT_KDF_ITERATIONS;
use proxima_crypto::{CryptoResult, DerivedKey, FactorSet, KeyDeriver, KEY_HASH_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;

fn default_iterations() -> u32 {
    DEFAULT_KDF_ITERATIONS
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialCommitment {
    salt: Vec<u8>,
    key_hash: Vec<u8>,
    #[serde(default = "default_iterations")]
    iterations: u32,
}

impl CredentialCommitment {
    /// Derive a master key from `factors` and commit to it.
    pub fn enroll(deriver: &KeyDeriver, factors: &FactorSet) -> CryptoResult<Self> {
        let derived = deriver.derive_factors(factors)?;
        Ok(Self::from_derived(&derived, deriver.iterations()))
    }

    /// Commit to a key derived with `iterations` PBKDF2 rounds.
    pub fn from_derived(derived: &DerivedKey, iterations: u32) -> Self {
        Self {
            salt: derived.salt.clone(),
            key_hash: derived.master_key.fingerprint().to_vec(),
            iterations,
        }
    }

    pub fn from_parts(salt: Vec<u8>, key_hash: Vec<u8>, iterations: u32) -> Self {
        Self {
            salt,
            key_hash,
            iterations,
        }
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn key_hash(&self) -> &[u8] {
        &self.key_hash
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn is_well_formed(&self) -> bool {
        self.key_hash.len() == KEY_HASH_SIZE && !self.salt.is_empty() && self.iterations > 0
    }

    /// True iff `factors` reproduce the committed key.
    pub fn verify(&self, factors: &FactorSet) -> bool {
        if self.iterations == 0 {
            return false;
        }
        KeyDeriver::with_iterations(self.iterations).verify_master_key(
            &factors.password,
            &factors.otp,
            &factors.device_key,
            &self.salt,
            &self.key_hash,
        )
    }
}

impl fmt::Debug for CredentialCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCommitment")
            .field("salt", &hex::encode(&self.salt))
            .field("key_hash", &hex::encode(&self.key_hash))
            .field("iterations", &self.iterations)
            .finish()
    }
}

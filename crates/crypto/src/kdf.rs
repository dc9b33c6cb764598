//! Three-factor key derivation.
//!
//! A master key is stretched from three independent factors:
//!
//! - **Factor 1**: password or passphrase (something you know)
//! - **Factor 2**: one-time code from a token (something you have)
//! - **Factor 3**: 256-bit device secret (something you possess)
//!
//! The factors are concatenated as `password || otp || device_key` and fed
//! through PBKDF2-HMAC-SHA256 with a fresh random salt. The derived key is
//! never stored; callers persist the salt together with the SHA-256
//! fingerprint of the key and later re-derive to verify.
//!
//! All key material is zeroized on drop.

use crate::error::{CryptoError, CryptoResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use proxima_core::config::{KdfConfig, DEFAULT_KDF_ITERATIONS, DEFAULT_SALT_LEN};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Device secret size (256 bits).
pub const FACTOR_KEY_SIZE: usize = 32;

/// Derived master key size (256 bits).
pub const MASTER_KEY_SIZE: usize = 32;

/// SHA-256 fingerprint size.
pub const KEY_HASH_SIZE: usize = 32;

/// Factor 3: a high-entropy secret held on the user's device.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct FactorKey([u8; FACTOR_KEY_SIZE]);

impl FactorKey {
    pub fn from_bytes(bytes: [u8; FACTOR_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let array: [u8; FACTOR_KEY_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::Validation(format!(
                "factor key must be {} bytes, got {}",
                FACTOR_KEY_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let bytes = Zeroizing::new(
            STANDARD
                .decode(encoded.trim())
                .map_err(|e| CryptoError::Validation(format!("factor key is not base64: {}", e)))?,
        );
        Self::from_slice(&bytes)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; FACTOR_KEY_SIZE] {
        &self.0
    }

    /// An all-zero key is treated as "factor not supplied".
    pub fn is_zero(&self) -> bool {
        self.0[..].ct_eq(&[0u8; FACTOR_KEY_SIZE][..]).into()
    }
}

impl PartialEq for FactorKey {
    fn eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl Eq for FactorKey {}

impl fmt::Debug for FactorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FactorKey(<redacted>)")
    }
}

/// 256-bit symmetric key produced by [`KeyDeriver`].
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; MASTER_KEY_SIZE]);

impl MasterKey {
    pub fn from_bytes(bytes: [u8; MASTER_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; MASTER_KEY_SIZE] {
        &self.0
    }

    /// SHA-256 digest of the key; safe to persist as a credential hash.
    pub fn fingerprint(&self) -> [u8; KEY_HASH_SIZE] {
        Sha256::digest(self.0).into()
    }
}

impl PartialEq for MasterKey {
    fn eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl Eq for MasterKey {}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(<redacted>)")
    }
}

/// The three authentication factors presented by a participant.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct FactorSet {
    pub password: String,
    pub otp: String,
    pub device_key: FactorKey,
}

impl FactorSet {
    pub fn new(password: impl Into<String>, otp: impl Into<String>, device_key: FactorKey) -> Self {
        Self {
            password: password.into(),
            otp: otp.into(),
            device_key,
        }
    }

    /// Check that the first `required` factors are present.
    ///
    /// Factors are ordered password, OTP, device key.
    pub fn validate(&self, required: usize) -> CryptoResult<()> {
        if required >= 1 && self.password.is_empty() {
            return Err(CryptoError::Validation("password factor missing".to_string()));
        }
        if required >= 2 && self.otp.is_empty() {
            return Err(CryptoError::Validation("one-time code factor missing".to_string()));
        }
        if required >= 3 && self.device_key.is_zero() {
            return Err(CryptoError::Validation("device key factor missing".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for FactorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactorSet")
            .field("password", &"<redacted>")
            .field("otp", &"<redacted>")
            .field("device_key", &self.device_key)
            .finish()
    }
}

/// Output of a fresh derivation: the key plus the salt needed to reproduce it.
#[derive(Debug, Clone)]
pub struct DerivedKey {
    pub master_key: MasterKey,
    pub salt: Vec<u8>,
}

/// PBKDF2-HMAC-SHA256 deriver.
#[derive(Debug, Clone)]
pub struct KeyDeriver {
    iterations: u32,
    salt_len: usize,
}

impl Default for KeyDeriver {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_KDF_ITERATIONS,
            salt_len: DEFAULT_SALT_LEN,
        }
    }
}

impl KeyDeriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deriver with a non-default iteration count. Intended for tests and
    /// benchmarks; production callers go through [`KeyDeriver::from_config`].
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations,
            ..Self::default()
        }
    }

    pub fn from_config(config: &KdfConfig) -> CryptoResult<Self> {
        if config.iterations == 0 {
            return Err(CryptoError::Derivation(
                "iteration count must be positive".to_string(),
            ));
        }
        if config.salt_len < DEFAULT_SALT_LEN {
            return Err(CryptoError::Validation(format!(
                "salt must be at least {} bytes",
                DEFAULT_SALT_LEN
            )));
        }
        Ok(Self {
            iterations: config.iterations,
            salt_len: config.salt_len,
        })
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Derive a master key under a freshly generated salt.
    ///
    /// Two calls with identical factors yield different keys because the
    /// salt differs; reuse [`KeyDeriver::derive_with_salt`] to reproduce one.
    pub fn derive_master_key(
        &self,
        password: &str,
        otp: &str,
        factor_key: &FactorKey,
    ) -> CryptoResult<DerivedKey> {
        let mut salt = vec![0u8; self.salt_len];
        OsRng.fill_bytes(&mut salt);

        let master_key = self.derive_with_salt(password, otp, factor_key, &salt)?;
        debug!(iterations = self.iterations, "Derived master key");

        Ok(DerivedKey { master_key, salt })
    }

    /// Deterministic derivation under a caller-supplied salt.
    pub fn derive_with_salt(
        &self,
        password: &str,
        otp: &str,
        factor_key: &FactorKey,
        salt: &[u8],
    ) -> CryptoResult<MasterKey> {
        if self.iterations == 0 {
            return Err(CryptoError::Derivation(
                "iteration count must be positive".to_string(),
            ));
        }
        if salt.len() < DEFAULT_SALT_LEN {
            return Err(CryptoError::Validation(format!(
                "salt must be at least {} bytes, got {}",
                DEFAULT_SALT_LEN,
                salt.len()
            )));
        }

        let input = combine_factors(password, otp, factor_key);
        let mut key = [0u8; MASTER_KEY_SIZE];
        pbkdf2::pbkdf2_hmac::<Sha256>(&input, salt, self.iterations, &mut key);

        let master_key = MasterKey::from_bytes(key);
        key.zeroize();
        Ok(master_key)
    }

    pub fn derive_factors(&self, factors: &FactorSet) -> CryptoResult<DerivedKey> {
        self.derive_master_key(&factors.password, &factors.otp, &factors.device_key)
    }

    /// Re-derive under `salt` and compare the key fingerprint against
    /// `expected_key_hash` in constant time.
    ///
    /// Any failure (short salt, malformed hash) yields `false`.
    pub fn verify_master_key(
        &self,
        password: &str,
        otp: &str,
        factor_key: &FactorKey,
        salt: &[u8],
        expected_key_hash: &[u8],
    ) -> bool {
        if expected_key_hash.len() != KEY_HASH_SIZE {
            return false;
        }
        match self.derive_with_salt(password, otp, factor_key, salt) {
            Ok(master_key) => master_key.fingerprint()[..].ct_eq(expected_key_hash).into(),
            Err(_) => false,
        }
    }
}

fn combine_factors(password: &str, otp: &str, factor_key: &FactorKey) -> Zeroizing<Vec<u8>> {
    let mut combined =
        Zeroizing::new(Vec::with_capacity(password.len() + otp.len() + FACTOR_KEY_SIZE));
    combined.extend_from_slice(password.as_bytes());
    combined.extend_from_slice(otp.as_bytes());
    combined.extend_from_slice(factor_key.as_bytes());
    combined
}

/// Generate a cryptographically secure 256-bit device secret (Factor 3).
pub fn generate_factor_key() -> FactorKey {
    let mut bytes = [0u8; FACTOR_KEY_SIZE];
    OsRng.fill_bytes(&mut bytes);
    let key = FactorKey::from_bytes(bytes);
    bytes.zeroize();
    key
}

/// Derive a master key with the default 100,000-iteration deriver.
pub fn derive_master_key(
    password: &str,
    otp: &str,
    factor_key: &FactorKey,
) -> CryptoResult<DerivedKey> {
    KeyDeriver::default().derive_master_key(password, otp, factor_key)
}

/// Verify factors against a stored salt and key hash with the default deriver.
pub fn verify_master_key(
    password: &str,
    otp: &str,
    factor_key: &FactorKey,
    salt: &[u8],
    expected_key_hash: &[u8],
) -> bool {
    KeyDeriver::default().verify_master_key(password, otp, factor_key, salt, expected_key_hash)
}

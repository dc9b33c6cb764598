//! Cryptographic primitives for the Proxima trust engine.
//!
//! This crate provides the cryptographic foundation for trust-scored access
//! control: three-factor key derivation, authenticated encryption of score
//! payloads and asymmetric attestation of the resulting envelopes.
//!
//! # Core Capabilities
//!
//! - **Key Derivation**: PBKDF2-HMAC-SHA256 over password, one-time code and device key
//! - **Score Envelopes**: AES-256-GCM sealing with per-message 96-bit nonces
//! - **Attestation**: RSA-2048 PKCS#1 v1.5 / SHA-256 signatures over canonical JSON
//!
//! # Security Principles
//!
//! - Never roll custom cryptographic primitives
//! - Secrets must never be logged; key material is zeroized on drop
//! - Use constant-time comparisons for key hashes
//! - Verification failures are reported as `false`, never as panics

pub mod attestation;
pub mod envelope;
pub mod error;
pub mod kdf;

pub use attestation::{
    canonical_bytes, generate_key_pair, public_key_fingerprint, public_key_from_pem,
    public_key_to_pem, sign_score, verify_score, AttestationKeyPair, SignedEnvelope,
    RSA_KEY_BITS, SIGNATURE_SCHEME,
};
pub use envelope::{
    decrypt_score, encrypt_score, EncryptedEnvelope, Metadata, ScoreCipher, ScorePayload,
    ALGORITHM, ENVELOPE_VERSION, NONCE_SIZE,
};
pub use error::{CryptoError, CryptoResult};
pub use kdf::{
    derive_master_key, generate_factor_key, verify_master_key, DerivedKey, FactorKey, FactorSet,
    KeyDeriver, MasterKey, FACTOR_KEY_SIZE, KEY_HASH_SIZE, MASTER_KEY_SIZE,
};

pub use rsa::{RsaPrivateKey, RsaPublicKey};

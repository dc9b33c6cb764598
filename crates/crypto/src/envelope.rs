//! Score envelopes: AES-256-GCM authenticated encryption of score payloads.
//!
//! A [`ScorePayload`] is serialized to JSON, sealed under a [`MasterKey`]
//! with a fresh 96-bit nonce, and shipped as an [`EncryptedEnvelope`] whose
//! binary fields are base64 text. The GCM tag is the only integrity check:
//! a wrong key, a flipped ciphertext byte or a flipped nonce byte all
//! surface as [`CryptoError::Decryption`].
//!
//! The algorithm name and envelope version are bound as associated data,
//! so relabelling an envelope also fails authentication.

use crate::error::{CryptoError, CryptoResult};
use crate::kdf::MasterKey;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use proxima_core::current_timestamp_ms;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Nonce size for AES-GCM (96 bits / 12 bytes).
pub const NONCE_SIZE: usize = 12;

pub const ALGORITHM: &str = "AES-256-GCM";
pub const KEY_SIZE_BITS: u32 = 256;
pub const ENVELOPE_VERSION: &str = "1.0";

/// Free-form score metadata. A `BTreeMap` keeps serialization key-ordered.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Plaintext content of an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorePayload {
    /// Score in [0, 1]
    pub score: f64,
    /// Unix timestamp in milliseconds
    pub timestamp: u64,
    pub participant_id: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl ScorePayload {
    /// Payload stamped with the current wall-clock time.
    pub fn new(score: f64, participant_id: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            score,
            timestamp: current_timestamp_ms(),
            participant_id: participant_id.into(),
            metadata,
        }
    }

    pub fn validate(&self) -> CryptoResult<()> {
        if !self.score.is_finite() || !(0.0..=1.0).contains(&self.score) {
            return Err(CryptoError::Validation(format!(
                "score must be within [0, 1], got {}",
                self.score
            )));
        }
        Ok(())
    }
}

/// Transport form of an encrypted score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    /// Base64 ciphertext with the 16-byte GCM tag appended
    pub ciphertext: String,
    /// Base64 96-bit nonce
    pub nonce: String,
    pub algorithm: String,
    pub key_size: u32,
    /// Unix timestamp in milliseconds when the envelope was sealed
    pub timestamp: u64,
    pub version: String,
}

/// AES-256-GCM cipher bound to one master key.
pub struct ScoreCipher {
    cipher: Aes256Gcm,
}

impl ScoreCipher {
    pub fn new(master_key: &MasterKey) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(master_key.as_bytes());
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Build a payload for `score` and seal it.
    pub fn encrypt_score(
        &self,
        score: f64,
        participant_id: &str,
        metadata: Metadata,
    ) -> CryptoResult<EncryptedEnvelope> {
        self.seal(&ScorePayload::new(score, participant_id, metadata))
    }

    /// Seal an existing payload under a fresh nonce.
    pub fn seal(&self, payload: &ScorePayload) -> CryptoResult<EncryptedEnvelope> {
        payload.validate()?;

        let plaintext = serde_json::to_vec(payload)
            .map_err(|e| CryptoError::Serialization(e.to_string()))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: &plaintext,
                    aad: &associated_data(),
                },
            )
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        debug!(
            participant_id = %payload.participant_id,
            ciphertext_len = ciphertext.len(),
            "Sealed score envelope"
        );

        Ok(EncryptedEnvelope {
            ciphertext: STANDARD.encode(ciphertext),
            nonce: STANDARD.encode(nonce_bytes),
            algorithm: ALGORITHM.to_string(),
            key_size: KEY_SIZE_BITS,
            timestamp: current_timestamp_ms(),
            version: ENVELOPE_VERSION.to_string(),
        })
    }

    /// Authenticate and decrypt an envelope.
    pub fn decrypt_score(&self, envelope: &EncryptedEnvelope) -> CryptoResult<ScorePayload> {
        if envelope.algorithm != ALGORITHM || envelope.key_size != KEY_SIZE_BITS {
            return Err(CryptoError::Decryption(format!(
                "unsupported algorithm: {} ({} bits)",
                envelope.algorithm, envelope.key_size
            )));
        }
        if envelope.version != ENVELOPE_VERSION {
            return Err(CryptoError::Decryption(format!(
                "unsupported envelope version: {}",
                envelope.version
            )));
        }

        let ciphertext = STANDARD
            .decode(&envelope.ciphertext)
            .map_err(|e| CryptoError::Decryption(format!("ciphertext is not base64: {}", e)))?;
        let nonce = STANDARD
            .decode(&envelope.nonce)
            .map_err(|e| CryptoError::Decryption(format!("nonce is not base64: {}", e)))?;
        if nonce.len() != NONCE_SIZE {
            return Err(CryptoError::Decryption(format!(
                "nonce must be {} bytes, got {}",
                NONCE_SIZE,
                nonce.len()
            )));
        }

        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: &ciphertext,
                    aad: &associated_data(),
                },
            )
            .map_err(|_| CryptoError::Decryption("authentication tag mismatch".to_string()))?;

        serde_json::from_slice(&plaintext)
            .map_err(|e| CryptoError::Decryption(format!("invalid payload: {}", e)))
    }
}

fn associated_data() -> Vec<u8> {
    format!("{}/{}", ALGORITHM, ENVELOPE_VERSION).into_bytes()
}

/// Encrypt a score under `master_key`.
pub fn encrypt_score(
    score: f64,
    participant_id: &str,
    metadata: Metadata,
    master_key: &MasterKey,
) -> CryptoResult<EncryptedEnvelope> {
    ScoreCipher::new(master_key).encrypt_score(score, participant_id, metadata)
}

/// Decrypt an envelope sealed by [`encrypt_score`].
pub fn decrypt_score(
    envelope: &EncryptedEnvelope,
    master_key: &MasterKey,
) -> CryptoResult<ScorePayload> {
    ScoreCipher::new(master_key).decrypt_score(envelope)
}

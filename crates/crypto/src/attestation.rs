//! Score attestation with RSA PKCS#1 v1.5 signatures.
//!
//! An attestation binds a payload (usually an [`EncryptedEnvelope`]) to the
//! holder of an RSA-2048 private key. Payloads are signed over their
//! canonical JSON form: the payload is first lowered to a `serde_json::Value`,
//! whose objects are key-sorted, and then serialized compactly. The same
//! canonicalization runs on verification, so field order in the caller's
//! types never causes spurious failures.
//!
//! # Security Model
//!
//! - Private keys never leave the [`AttestationKeyPair`] that generated them
//! - Verification is payload-exact: any changed byte invalidates the signature
//! - [`verify_score`] never errors; every failure is reported as `false`

use crate::envelope::EncryptedEnvelope;
use crate::error::{CryptoError, CryptoResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::{debug, warn};

/// RSA modulus size in bits.
pub const RSA_KEY_BITS: usize = 2048;

pub const SIGNATURE_SCHEME: &str = "RSA-PKCS1v15-SHA256";

/// Asymmetric signing key pair.
///
/// Not `Clone`: share it behind an `Arc`. The private half is reachable
/// only through [`AttestationKeyPair::sign`] and
/// [`AttestationKeyPair::attest`].
pub struct AttestationKeyPair {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
}

impl AttestationKeyPair {
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub fn sign<T: Serialize>(&self, payload: &T) -> CryptoResult<String> {
        sign_score(&self.private_key, payload)
    }

    /// Sign an envelope and bundle it with the signer's key fingerprint.
    pub fn attest(&self, envelope: EncryptedEnvelope) -> CryptoResult<SignedEnvelope> {
        let signature = self.sign(&envelope)?;
        Ok(SignedEnvelope {
            envelope,
            signature,
            signer: public_key_fingerprint(&self.public_key)?,
            scheme: SIGNATURE_SCHEME.to_string(),
        })
    }
}

impl fmt::Debug for AttestationKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttestationKeyPair")
            .field("public_key", &public_key_fingerprint(&self.public_key).ok())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// An envelope together with its attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    pub envelope: EncryptedEnvelope,
    /// Base64 PKCS#1 v1.5 signature over the canonical envelope JSON
    pub signature: String,
    /// Hex SHA-256 fingerprint of the signer's public key
    pub signer: String,
    pub scheme: String,
}

impl SignedEnvelope {
    /// True only if `public_key` is the recorded signer and the signature
    /// covers this exact envelope.
    pub fn verify(&self, public_key: &RsaPublicKey) -> bool {
        if self.scheme != SIGNATURE_SCHEME {
            return false;
        }
        match public_key_fingerprint(public_key) {
            Ok(fingerprint) if fingerprint == self.signer => {
                verify_score(public_key, &self.envelope, &self.signature)
            }
            _ => false,
        }
    }
}

/// Generate an RSA-2048 signing key pair (public exponent 65537).
pub fn generate_key_pair() -> CryptoResult<AttestationKeyPair> {
    let private_key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
        .map_err(|e| CryptoError::Signature(format!("key generation failed: {}", e)))?;
    let public_key = RsaPublicKey::from(&private_key);
    debug!(bits = RSA_KEY_BITS, "Generated attestation key pair");
    Ok(AttestationKeyPair {
        private_key,
        public_key,
    })
}

/// Canonical bytes signed for `payload`.
pub fn canonical_bytes<T: Serialize>(payload: &T) -> CryptoResult<Vec<u8>> {
    let value =
        serde_json::to_value(payload).map_err(|e| CryptoError::Serialization(e.to_string()))?;
    serde_json::to_vec(&value).map_err(|e| CryptoError::Serialization(e.to_string()))
}

/// Sign the canonical serialization of `payload`. Returns a base64 signature.
pub fn sign_score<T: Serialize>(private_key: &RsaPrivateKey, payload: &T) -> CryptoResult<String> {
    let message = canonical_bytes(payload)?;
    let signing_key = SigningKey::<Sha256>::new(private_key.clone());
    let signature = signing_key
        .try_sign(&message)
        .map_err(|e| CryptoError::Signature(e.to_string()))?;
    Ok(STANDARD.encode(signature.to_bytes()))
}

/// Verify a base64 signature over the canonical serialization of `payload`.
///
/// Malformed signatures, mismatched keys and serialization failures all
/// return `false`.
pub fn verify_score<T: Serialize>(public_key: &RsaPublicKey, payload: &T, signature: &str) -> bool {
    let outcome = (|| -> CryptoResult<()> {
        let message = canonical_bytes(payload)?;
        let signature_bytes = STANDARD
            .decode(signature)
            .map_err(|e| CryptoError::Signature(format!("signature is not base64: {}", e)))?;
        let signature = Signature::try_from(signature_bytes.as_slice())
            .map_err(|e| CryptoError::Signature(e.to_string()))?;
        VerifyingKey::<Sha256>::new(public_key.clone())
            .verify(&message, &signature)
            .map_err(|e| CryptoError::Signature(e.to_string()))
    })();

    match outcome {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Score signature rejected");
            false
        }
    }
}

/// SubjectPublicKeyInfo PEM encoding of a verifying key.
pub fn public_key_to_pem(public_key: &RsaPublicKey) -> CryptoResult<String> {
    public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| CryptoError::Signature(e.to_string()))
}

pub fn public_key_from_pem(pem: &str) -> CryptoResult<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem).map_err(|e| CryptoError::Signature(e.to_string()))
}

/// Hex SHA-256 of the DER-encoded public key.
pub fn public_key_fingerprint(public_key: &RsaPublicKey) -> CryptoResult<String> {
    let der = public_key
        .to_public_key_der()
        .map_err(|e| CryptoError::Signature(e.to_string()))?;
    Ok(hex::encode(Sha256::digest(der.as_bytes())))
}

//! Key derivation, score envelopes and attestation end to end

use crate::test_utils::*;
use proxima_crypto::{
    decrypt_score, encrypt_score, public_key_from_pem, public_key_to_pem, verify_score,
    CryptoError, Metadata,
};
use proxima_trust_mesh::{calculate_influence_score, InfluenceMetrics, ScoreAttestationPipeline};
use serde_json::json;

fn west() -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("region".to_string(), json!("west"));
    metadata
}

#[test]
fn test_three_factor_key_round_trips_score() {
    let factors = sample_factors();
    let derived = test_deriver().derive_factors(&factors).unwrap();

    let envelope = encrypt_score(0.82, "node-1", west(), &derived.master_key).unwrap();
    let payload = decrypt_score(&envelope, &derived.master_key).unwrap();

    assert_eq!(payload.score, 0.82);
    assert_eq!(payload.participant_id, "node-1");
    assert_eq!(payload.metadata, west());
}

#[test]
fn test_rederived_key_opens_envelope_but_other_factors_do_not() {
    let deriver = test_deriver();
    let factors = sample_factors();
    let derived = deriver.derive_factors(&factors).unwrap();
    let envelope = encrypt_score(0.5, "node-1", Metadata::new(), &derived.master_key).unwrap();

    let same = deriver
        .derive_with_salt(&factors.password, &factors.otp, &factors.device_key, &derived.salt)
        .unwrap();
    assert_eq!(decrypt_score(&envelope, &same).unwrap().score, 0.5);

    let other_device = sample_factors();
    let other = deriver
        .derive_with_salt(
            &factors.password,
            &factors.otp,
            &other_device.device_key,
            &derived.salt,
        )
        .unwrap();
    assert!(matches!(
        decrypt_score(&envelope, &other),
        Err(CryptoError::Decryption(_))
    ));
}

#[test]
fn test_influence_score_example() {
    let score = calculate_influence_score(&InfluenceMetrics {
        network_size: 5_000,
        max_network_size: Some(10_000),
        engagement_rate: 0.75,
        trust_score: 0.85,
        activity_level: 0.90,
    });
    assert!((score - 0.73).abs() < 1e-9);
}

#[test]
fn test_signature_survives_pem_exchange() {
    let key_pair = shared_key_pair();
    let derived = test_deriver().derive_factors(&sample_factors()).unwrap();
    let envelope = encrypt_score(0.9, "node-1", west(), &derived.master_key).unwrap();

    let signature = key_pair.sign(&envelope).unwrap();
    let pem = public_key_to_pem(key_pair.public_key()).unwrap();
    let imported = public_key_from_pem(&pem).unwrap();

    assert!(verify_score(&imported, &envelope, &signature));

    let mut relabelled = envelope.clone();
    relabelled.version = "2.0".to_string();
    assert!(!verify_score(&imported, &relabelled, &signature));
}

#[tokio::test]
async fn test_attestation_pipeline_end_to_end() {
    let pipeline = ScoreAttestationPipeline::with_key_pair(test_deriver(), shared_key_pair());
    let factors = sample_factors();
    let metrics = InfluenceMetrics {
        network_size: 5_000,
        max_network_size: Some(10_000),
        engagement_rate: 0.75,
        trust_score: 0.85,
        activity_level: 0.90,
    };

    let attested = pipeline
        .attest("node-1", factors.clone(), &metrics, west())
        .await
        .unwrap();
    assert!(pipeline.verify(&attested));

    // The attestation is portable: serialize, ship, verify elsewhere.
    let wire = serde_json::to_string(&attested).unwrap();
    let received: proxima_trust_mesh::AttestedScore = serde_json::from_str(&wire).unwrap();
    assert!(received.signed.verify(pipeline.public_key()));

    let payload = pipeline.open(&received, factors).await.unwrap();
    assert!((payload.score - 0.73).abs() < 1e-9);
    assert_eq!(payload.metadata, west());
}

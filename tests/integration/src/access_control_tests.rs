//! Registry enrollment, authentication and access gates

use crate::test_utils::*;
use proxima_core::{EngineConfig, FixedClock, SecurityLevel};
use proxima_trust_mesh::{
    AuditAction, AuditFilter, InMemoryRepository, ParticipantMetrics, ParticipantRegistration,
    RegistryError, SharedTrustRegistry, TrustRegistry,
};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_zero_metrics_participant_is_denied_mesh_access() {
    let mut registry = registry_with_providers();
    let node = registry
        .register_participant(
            ParticipantRegistration::new("node-1", SecurityLevel::Mesh)
                .metrics(ParticipantMetrics::default()),
        )
        .unwrap();
    assert_eq!(node.trust_score, 0.0);

    match registry.access_service("node-1", "mesh-svc", SecurityLevel::Mesh) {
        Err(RegistryError::InsufficientTrust { required, actual }) => {
            assert_eq!(required, 0.75);
            assert_eq!(actual, 0.0);
        }
        other => panic!("expected insufficient trust, got {:?}", other),
    }
}

#[test]
fn test_mesh_threshold_is_inclusive_and_utility_is_not_met() {
    let mut registry = registry_with_providers();
    registry
        .register_participant(ParticipantRegistration::new("node-1", SecurityLevel::Mesh))
        .unwrap();
    registry.update_trust_score("node-1", 0.75).unwrap();

    assert!(registry
        .access_service("node-1", "mesh-svc", SecurityLevel::Mesh)
        .is_ok());
    assert!(matches!(
        registry.access_service("node-1", "utility-svc", SecurityLevel::Utility),
        Err(RegistryError::InsufficientTrust { .. })
    ));
}

#[test]
fn test_authentication_lifts_participant_into_bank_tier() {
    let mut registry = registry_with_providers();
    let (registration, factors) = enrolled_participant("bank-1", SecurityLevel::Bank);
    registry
        .register_participant(registration.metrics(ParticipantMetrics {
            network_size: 10_000,
            engagement_rate: 1.0,
            security_compliance: 1.0,
            ethical_standards: 1.0,
            audit_score: 0.5,
            ..ParticipantMetrics::default()
        }))
        .unwrap();
    assert!((registry.trust_score("bank-1").unwrap() - 0.95).abs() < 1e-12);

    let after = registry.authenticate_participant("bank-1", &factors).unwrap();
    assert_eq!(after, 1.0);

    let grant = registry
        .access_service("bank-1", "bank-svc", SecurityLevel::Bank)
        .unwrap();
    assert_eq!(grant.required_score, 0.95);
    assert!(!grant.grant_id.is_empty());

    let actions: Vec<AuditAction> = registry
        .get_audit_trail(&AuditFilter::all().participant("bank-1"))
        .iter()
        .map(|entry| entry.action)
        .collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::ParticipantRegistered,
            AuditAction::ParticipantAuthenticated,
            AuditAction::ServiceAccessed,
        ]
    );
}

#[test]
fn test_wrong_factors_leave_registry_untouched() {
    let mut registry = registry_with_providers();
    let (registration, factors) = enrolled_participant("util-1", SecurityLevel::Utility);
    registry.register_participant(registration).unwrap();
    let status_before = registry.get_network_status();

    let mut wrong = factors.clone();
    wrong.otp = "654321".to_string();
    assert!(matches!(
        registry.authenticate_participant("util-1", &wrong),
        Err(RegistryError::Authentication { .. })
    ));

    let mut missing = factors;
    missing.otp.clear();
    assert!(registry.authenticate_participant("util-1", &missing).is_err());

    assert_eq!(registry.get_network_status(), status_before);
}

#[test]
fn test_audit_window_queries() {
    let clock = FixedClock::new(1_700_000_000_000);
    let mut registry = TrustRegistry::new()
        .with_deriver(test_deriver())
        .with_clock(Arc::new(clock.clone()));

    registry
        .register_participant(ParticipantRegistration::new("a", SecurityLevel::Mesh))
        .unwrap();
    clock.advance(Duration::from_secs(3_600));
    registry.update_trust_score("a", 0.4).unwrap();
    clock.advance(Duration::from_secs(3_600));
    registry.update_trust_score("a", 0.4).unwrap();

    let first_hour = registry.get_audit_trail(
        &AuditFilter::all()
            .since(1_700_000_000_000)
            .until(1_700_000_000_000 + 3_600_000),
    );
    assert_eq!(first_hour.len(), 2);

    let updates =
        registry.get_audit_trail(&AuditFilter::all().action(AuditAction::TrustScoreUpdated));
    assert_eq!(updates.len(), 2);
    assert!(updates[0].timestamp < updates[1].timestamp);
}

#[test]
fn test_registry_from_toml_config() {
    let config = EngineConfig::from_toml_str(
        r#"
        [kdf]
        iterations = 1000

        [trust]
        auth_success_delta = 0.2
        "#,
    )
    .unwrap();
    let mut registry = TrustRegistry::from_config(&config, InMemoryRepository::new()).unwrap();

    let (registration, factors) = enrolled_participant("mesh-1", SecurityLevel::Mesh);
    registry.register_participant(registration).unwrap();
    assert_eq!(registry.authenticate_participant("mesh-1", &factors).unwrap(), 0.2);
    assert_eq!(registry.repository().audit_entries().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_authentications_all_land() {
    let shared = SharedTrustRegistry::new(registry_with_providers());

    let mut participants = Vec::new();
    for i in 0..8 {
        let (registration, factors) =
            enrolled_participant(&format!("node-{}", i), SecurityLevel::Utility);
        shared.register_participant(registration).await.unwrap();
        participants.push((format!("node-{}", i), factors));
    }

    let mut handles = Vec::new();
    for (id, factors) in participants {
        let handle = shared.clone();
        handles.push(tokio::spawn(async move {
            handle.authenticate_participant(&id, factors).await
        }));
    }
    for handle in handles {
        let score = handle.await.unwrap().unwrap();
        assert!((score - 0.10).abs() < 1e-12);
    }

    let status = shared.get_network_status().await;
    assert_eq!(status.total_nodes, 8);
    assert!((status.average_trust_score - 0.10).abs() < 1e-12);

    let trail = shared.get_audit_trail(&AuditFilter::all()).await;
    assert!(trail
        .windows(2)
        .all(|pair| pair[0].sequence < pair[1].sequence && pair[0].timestamp <= pair[1].timestamp));
}

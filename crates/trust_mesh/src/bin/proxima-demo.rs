//! Proxima demo
//!
//! Runs the attestation pipeline and a registry session end to end:
//! derive a master key from three factors, score and seal an influence
//! report, sign it, then enroll, authenticate and gate a participant.

use anyhow::{bail, Context, Result};
use proxima_core::{logging, EngineConfig, SecurityLevel};
use proxima_crypto::{generate_factor_key, public_key_fingerprint, FactorSet, KeyDeriver, Metadata};
use proxima_trust_mesh::{
    AccessGrant, AuditFilter, CredentialCommitment, InfluenceMetrics, NetworkStatus,
    ParticipantMetrics, ParticipantRegistration, ProviderRegistration, RegistryError,
    ScoreAttestationPipeline, ScoringEngine, SharedTrustRegistry, TrustRegistry,
};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::process;

/// JSON output for a full run
#[derive(Debug, Serialize)]
struct DemoOutput {
    influence_score: f64,
    decrypted_score: f64,
    signature_valid: bool,
    signer: String,
    trust_after_auth: f64,
    grant: Option<AccessGrant>,
    denied_bank_access: Option<String>,
    network: NetworkStatus,
    audit_entries: usize,
}

struct Options {
    config: Option<PathBuf>,
    json: bool,
}

fn parse_args() -> Result<Options, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut options = Options {
        config: None,
        json: false,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--json" => options.json = true,
            "--config" => {
                i += 1;
                if i < args.len() {
                    options.config = Some(PathBuf::from(&args[i]));
                } else {
                    return Err("--config requires a path".to_string());
                }
            }
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            other => return Err(format!("Unknown argument: {}", other)),
        }
        i += 1;
    }

    Ok(options)
}

fn print_usage() {
    eprintln!("Proxima demo");
    eprintln!();
    eprintln!("Usage: proxima-demo [--json] [--config <path>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --json           Print a JSON summary instead of log lines");
    eprintln!("  --config <path>  Load engine configuration from a TOML file");
}

async fn run(config: EngineConfig, json_output: bool) -> Result<()> {
    let deriver = KeyDeriver::from_config(&config.kdf).context("invalid KDF configuration")?;
    let factors = FactorSet::new("p1", "123456", generate_factor_key());

    let scoring =
        ScoringEngine::default().with_max_network_size(config.trust.default_max_network_size);
    let pipeline = ScoreAttestationPipeline::new(deriver.clone())
        .await?
        .with_scoring(scoring);
    let metrics = InfluenceMetrics {
        network_size: 5_000,
        max_network_size: None,
        engagement_rate: 0.75,
        trust_score: 0.85,
        activity_level: 0.90,
    };
    let mut metadata = Metadata::new();
    metadata.insert("region".to_string(), json!("west"));

    let attested = pipeline
        .attest("node-1", factors.clone(), &metrics, metadata)
        .await?;
    let signature_valid = pipeline.verify(&attested);
    if !signature_valid {
        bail!("attestation did not verify against its own key");
    }
    let payload = pipeline.open(&attested, factors.clone()).await?;
    tracing::info!(
        score = attested.score,
        decrypted = payload.score,
        "Influence score attested"
    );

    let registry = TrustRegistry::from_config(&config, proxima_trust_mesh::InMemoryRepository::new())?;
    let shared = SharedTrustRegistry::new(registry);

    shared
        .register_service_provider(
            ProviderRegistration::new("mesh-relay", "Mesh Relay", SecurityLevel::Mesh)
                .provider_type("relay")
                .services(["routing"]),
        )
        .await?;
    shared
        .register_service_provider(
            ProviderRegistration::new("settlement", "Settlement", SecurityLevel::Bank)
                .provider_type("bank")
                .services(["payments"]),
        )
        .await?;

    let credential = CredentialCommitment::enroll(&deriver, &factors)?;
    shared
        .register_participant(
            ParticipantRegistration::new("node-1", SecurityLevel::Bank)
                .node_type("edge")
                .location("west")
                .metrics(ParticipantMetrics {
                    network_size: 5_000,
                    max_network_size: None,
                    engagement_rate: 0.75,
                    security_compliance: 0.9,
                    ethical_standards: 0.8,
                    audit_score: 0.7,
                })
                .credential(credential),
        )
        .await?;

    let trust_after_auth = shared.authenticate_participant("node-1", factors).await?;

    let grant = match shared
        .access_service("node-1", "mesh-relay", SecurityLevel::Mesh)
        .await
    {
        Ok(grant) => Some(grant),
        Err(RegistryError::InsufficientTrust { .. }) => None,
        Err(e) => return Err(e.into()),
    };
    let denied_bank_access = match shared
        .access_service("node-1", "settlement", SecurityLevel::Bank)
        .await
    {
        Ok(_) => None,
        Err(e @ RegistryError::InsufficientTrust { .. }) => Some(e.to_string()),
        Err(e) => return Err(e.into()),
    };

    let network = shared.get_network_status().await;
    let audit_entries = shared.get_audit_trail(&AuditFilter::all()).await.len();

    if json_output {
        let output = DemoOutput {
            influence_score: attested.score,
            decrypted_score: payload.score,
            signature_valid,
            signer: public_key_fingerprint(pipeline.public_key())?,
            trust_after_auth,
            grant,
            denied_bank_access,
            network,
            audit_entries,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        tracing::info!(
            trust_after_auth,
            granted = grant.is_some(),
            total_nodes = network.total_nodes,
            average_trust = network.average_trust_score,
            audit_entries,
            "Registry session complete"
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let options = match parse_args() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    let config = match &options.config {
        Some(path) => match EngineConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: failed to load {}: {:#}", path.display(), e);
                process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };

    // JSON mode keeps stdout clean for the summary.
    if !options.json {
        logging::init_from_config(&config.logging);
    }

    if let Err(e) = run(config, options.json).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

//! Scoring Engine
//!
//! Pure, bounded scoring of influence and participant trust. Every metric is
//! normalized into [0, 1], multiplied by a fixed weight, and summed; the sum
//! is clamped into [0, 1] so oversized or malformed inputs can never escape
//! the score range.

use proxima_core::config::DEFAULT_MAX_NETWORK_SIZE;
use serde::{Deserialize, Serialize};

/// Weights for the individual influence score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfluenceWeights {
    pub network_size: f64,
    pub engagement_rate: f64,
    pub trust_score: f64,
    pub activity_level: f64,
}

impl InfluenceWeights {
    pub fn total(&self) -> f64 {
        self.network_size + self.engagement_rate + self.trust_score + self.activity_level
    }
}

impl Default for InfluenceWeights {
    fn default() -> Self {
        Self {
            network_size: 0.30,
            engagement_rate: 0.25,
            trust_score: 0.25,
            activity_level: 0.20,
        }
    }
}

/// Weights for the participant trust score used at registration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticipantWeights {
    pub network_size: f64,
    pub engagement_rate: f64,
    pub security_compliance: f64,
    pub ethical_standards: f64,
    pub audit_score: f64,
}

impl ParticipantWeights {
    pub fn total(&self) -> f64 {
        self.network_size
            + self.engagement_rate
            + self.security_compliance
            + self.ethical_standards
            + self.audit_score
    }
}

impl Default for ParticipantWeights {
    fn default() -> Self {
        Self {
            network_size: 0.25,
            engagement_rate: 0.20,
            security_compliance: 0.25,
            ethical_standards: 0.20,
            audit_score: 0.10,
        }
    }
}

/// Inputs to the individual influence score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluenceMetrics {
    #[serde(default)]
    pub network_size: u64,
    /// Normalization ceiling; the engine's configured ceiling when absent
    #[serde(default)]
    pub max_network_size: Option<u64>,
    #[serde(default)]
    pub engagement_rate: f64,
    #[serde(default)]
    pub trust_score: f64,
    #[serde(default)]
    pub activity_level: f64,
}

impl Default for InfluenceMetrics {
    fn default() -> Self {
        Self {
            network_size: 0,
            max_network_size: None,
            engagement_rate: 0.0,
            trust_score: 0.0,
            activity_level: 0.0,
        }
    }
}

/// Inputs to the participant trust score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantMetrics {
    #[serde(default)]
    pub network_size: u64,
    #[serde(default)]
    pub max_network_size: Option<u64>,
    #[serde(default)]
    pub engagement_rate: f64,
    #[serde(default)]
    pub security_compliance: f64,
    #[serde(default)]
    pub ethical_standards: f64,
    #[serde(default)]
    pub audit_score: f64,
}

impl Default for ParticipantMetrics {
    fn default() -> Self {
        Self {
            network_size: 0,
            max_network_size: None,
            engagement_rate: 0.0,
            security_compliance: 0.0,
            ethical_standards: 0.0,
            audit_score: 0.0,
        }
    }
}

/// Weighted scorer. Holds the two weight profiles and the network-size
/// ceiling used when metrics carry none; all methods are pure.
#[derive(Debug, Clone, Copy)]
pub struct ScoringEngine {
    influence: InfluenceWeights,
    participant: ParticipantWeights,
    max_network_size: u64,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::with_weights(InfluenceWeights::default(), ParticipantWeights::default())
    }
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(influence: InfluenceWeights, participant: ParticipantWeights) -> Self {
        Self {
            influence,
            participant,
            max_network_size: DEFAULT_MAX_NETWORK_SIZE,
        }
    }

    pub fn with_max_network_size(mut self, max_network_size: u64) -> Self {
        self.max_network_size = max_network_size;
        self
    }

    pub fn max_network_size(&self) -> u64 {
        self.max_network_size
    }

    pub fn influence_weights(&self) -> &InfluenceWeights {
        &self.influence
    }

    pub fn participant_weights(&self) -> &ParticipantWeights {
        &self.participant
    }

    pub fn influence_score(&self, metrics: &InfluenceMetrics) -> f64 {
        let w = &self.influence;
        let max = metrics.max_network_size.unwrap_or(self.max_network_size);
        let score = normalize_count(metrics.network_size, max) * w.network_size
            + normalize_ratio(metrics.engagement_rate) * w.engagement_rate
            + normalize_ratio(metrics.trust_score) * w.trust_score
            + normalize_ratio(metrics.activity_level) * w.activity_level;
        clamp_unit(score)
    }

    pub fn participant_trust(&self, metrics: &ParticipantMetrics) -> f64 {
        let w = &self.participant;
        let max = metrics.max_network_size.unwrap_or(self.max_network_size);
        let score = normalize_count(metrics.network_size, max) * w.network_size
            + normalize_ratio(metrics.engagement_rate) * w.engagement_rate
            + normalize_ratio(metrics.security_compliance) * w.security_compliance
            + normalize_ratio(metrics.ethical_standards) * w.ethical_standards
            + normalize_ratio(metrics.audit_score) * w.audit_score;
        clamp_unit(score)
    }
}

/// Influence score with the default weight profile.
pub fn calculate_influence_score(metrics: &InfluenceMetrics) -> f64 {
    ScoringEngine::default().influence_score(metrics)
}

/// Participant trust score with the default weight profile.
pub fn calculate_participant_trust(metrics: &ParticipantMetrics) -> f64 {
    ScoringEngine::default().participant_trust(metrics)
}

/// True iff `0 <= score <= 1`.
pub fn validate_score(score: f64) -> bool {
    (0.0..=1.0).contains(&score)
}

/// Clamp into [0, 1]; NaN maps to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn normalize_ratio(value: f64) -> f64 {
    clamp_unit(value)
}

fn normalize_count(value: u64, max: u64) -> f64 {
    if max == 0 {
        return 0.0;
    }
    clamp_unit(value as f64 / max as f64)
}

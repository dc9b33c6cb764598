//! Shared domain types

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Security tier of a participant, a service provider, or an access request.
///
/// Each tier fixes the minimum trust score needed for access, the number of
/// authentication factors a participant must present, and the operational
/// parameters (cipher, audit cadence, compliance regime) attached to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityLevel {
    /// Financial-grade tier, three-factor authentication
    Bank,
    /// Critical infrastructure tier
    Utility,
    /// General mesh participation
    Mesh,
}

impl SecurityLevel {
    pub const ALL: [SecurityLevel; 3] = [
        SecurityLevel::Bank,
        SecurityLevel::Utility,
        SecurityLevel::Mesh,
    ];

    /// Minimum trust score required to access a service at this tier (inclusive).
    pub const fn min_trust_score(self) -> f64 {
        match self {
            SecurityLevel::Bank => 0.95,
            SecurityLevel::Utility => 0.85,
            SecurityLevel::Mesh => 0.75,
        }
    }

    /// Number of authentication factors required at this tier.
    pub const fn auth_factors(self) -> usize {
        match self {
            SecurityLevel::Bank => 3,
            SecurityLevel::Utility => 2,
            SecurityLevel::Mesh => 1,
        }
    }

    pub const fn requires_three_factor(self) -> bool {
        self.auth_factors() >= 3
    }

    /// Authenticated cipher mandated for data at rest and in transit.
    pub const fn encryption(self) -> &'static str {
        "AES-256-GCM"
    }

    pub const fn audit_cadence(self) -> &'static str {
        match self {
            SecurityLevel::Bank => "real-time",
            SecurityLevel::Utility => "hourly",
            SecurityLevel::Mesh => "daily",
        }
    }

    pub const fn compliance(self) -> &'static str {
        match self {
            SecurityLevel::Bank => "PCI-DSS",
            SecurityLevel::Utility => "NERC-CIP",
            SecurityLevel::Mesh => "ISO-27001",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SecurityLevel::Bank => "BANK",
            SecurityLevel::Utility => "UTILITY",
            SecurityLevel::Mesh => "MESH",
        }
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecurityLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BANK" => Ok(SecurityLevel::Bank),
            "UTILITY" => Ok(SecurityLevel::Utility),
            "MESH" => Ok(SecurityLevel::Mesh),
            other => Err(CoreError::UnknownSecurityLevel(other.to_string())),
        }
    }
}

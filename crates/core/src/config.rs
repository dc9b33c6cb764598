//! Configuration management for Proxima.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
#[cfg(feature = "toml")]
use std::path::Path;

/// PBKDF2 iteration count used for master key derivation.
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;

/// Salt length in bytes (128 bits).
pub const DEFAULT_SALT_LEN: usize = 16;

/// Trust increase applied after a successful authentication.
pub const DEFAULT_AUTH_SUCCESS_DELTA: f64 = 0.10;

/// Network size treated as "maximal" when normalizing influence metrics.
pub const DEFAULT_MAX_NETWORK_SIZE: u64 = 10_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub kdf: KdfConfig,
    pub trust: TrustConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfConfig {
    pub iterations: u32,
    pub salt_len: usize,
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_KDF_ITERATIONS,
            salt_len: DEFAULT_SALT_LEN,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    pub auth_success_delta: f64,
    pub default_max_network_size: u64,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            auth_success_delta: DEFAULT_AUTH_SUCCESS_DELTA,
            default_max_network_size: DEFAULT_MAX_NETWORK_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl EngineConfig {
    #[cfg(feature = "toml")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.kdf.iterations == 0 {
            return Err(CoreError::InvalidConfig(
                "kdf.iterations must be positive".to_string(),
            ));
        }
        if self.kdf.salt_len < DEFAULT_SALT_LEN {
            return Err(CoreError::InvalidConfig(format!(
                "kdf.salt_len must be at least {} bytes",
                DEFAULT_SALT_LEN
            )));
        }
        let delta = self.trust.auth_success_delta;
        if !delta.is_finite() || !(0.0..=1.0).contains(&delta) {
            return Err(CoreError::InvalidConfig(format!(
                "trust.auth_success_delta must be within [0, 1], got {}",
                delta
            )));
        }
        if self.trust.default_max_network_size == 0 {
            return Err(CoreError::InvalidConfig(
                "trust.default_max_network_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

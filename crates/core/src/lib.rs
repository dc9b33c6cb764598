//! Core functionality for the Proxima trust engine.
//!
//! This crate provides the fundamental types, configuration, logging and
//! time sources shared by the cryptographic and trust-mesh crates.

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use clock::{current_timestamp_ms, Clock, FixedClock, SystemClock};
pub use config::{EngineConfig, KdfConfig, LoggingConfig, TrustConfig};
pub use error::{CoreError, Result};
pub use types::SecurityLevel;

//! End-to-end tests across the Proxima crates
//!
//! This test suite validates:
//! - Three-factor key derivation feeding score envelopes
//! - Attestation of sealed scores and key exchange via PEM
//! - Registry enrollment, authentication and tiered access gates
//! - Audit trail ordering under concurrent mutation

pub mod test_utils;

#[cfg(test)]
mod access_control_tests;

#[cfg(test)]
mod score_pipeline_tests;

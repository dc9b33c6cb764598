//! Audit Trail Module
//!
//! Append-only, chronologically ordered record of registrations,
//! authentications, trust adjustments and service-access grants.
//! Entries are never mutated or removed once committed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of event recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    ParticipantRegistered,
    ProviderRegistered,
    ParticipantAuthenticated,
    TrustScoreUpdated,
    ServiceAccessed,
}

impl AuditAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            AuditAction::ParticipantRegistered => "PARTICIPANT_REGISTERED",
            AuditAction::ProviderRegistered => "PROVIDER_REGISTERED",
            AuditAction::ParticipantAuthenticated => "PARTICIPANT_AUTHENTICATED",
            AuditAction::TrustScoreUpdated => "TRUST_SCORE_UPDATED",
            AuditAction::ServiceAccessed => "SERVICE_ACCESSED",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Position in the trail, starting at 0
    pub sequence: u64,
    /// Unix milliseconds, non-decreasing along the trail
    pub timestamp: u64,
    pub action: AuditAction,
    /// Participant (or provider) the entry concerns
    pub participant_id: String,
    pub details: serde_json::Value,
}

/// Optional constraints for [`AuditLog::query`]. Time bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFilter {
    pub participant_id: Option<String>,
    pub action: Option<AuditAction>,
    pub from: Option<u64>,
    pub until: Option<u64>,
}

impl AuditFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn participant(mut self, participant_id: impl Into<String>) -> Self {
        self.participant_id = Some(participant_id.into());
        self
    }

    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn since(mut self, from_ms: u64) -> Self {
        self.from = Some(from_ms);
        self
    }

    pub fn until(mut self, until_ms: u64) -> Self {
        self.until = Some(until_ms);
        self
    }

    pub fn matches(&self, entry: &AuditEntry) -> bool {
        self.participant_id
            .as_deref()
            .map_or(true, |id| entry.participant_id == id)
            && self.action.map_or(true, |action| entry.action == action)
            && self.from.map_or(true, |from| entry.timestamp >= from)
            && self.until.map_or(true, |until| entry.timestamp <= until)
    }
}

/// In-memory append-only audit log.
///
/// Appending is split into [`AuditLog::prepare`] and [`AuditLog::commit`]
/// so the caller can persist an entry before it becomes visible.
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the next entry without appending it.
    ///
    /// The timestamp is raised to the previous entry's timestamp if the
    /// clock went backwards, keeping the trail chronological.
    pub fn prepare(
        &self,
        timestamp: u64,
        action: AuditAction,
        participant_id: &str,
        details: serde_json::Value,
    ) -> AuditEntry {
        let floor = self.entries.last().map_or(0, |last| last.timestamp);
        AuditEntry {
            sequence: self.entries.len() as u64,
            timestamp: timestamp.max(floor),
            action,
            participant_id: participant_id.to_string(),
            details,
        }
    }

    /// Append an entry produced by [`AuditLog::prepare`] on this log.
    ///
    /// Returns `false` and drops the entry if another entry was committed
    /// in between.
    pub fn commit(&mut self, entry: AuditEntry) -> bool {
        if entry.sequence != self.entries.len() as u64 {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Entries matching `filter`, in insertion order.
    pub fn query(&self, filter: &AuditFilter) -> Vec<AuditEntry> {
        self.entries
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect()
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

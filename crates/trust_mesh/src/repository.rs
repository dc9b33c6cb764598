//! Persistence seam.
//!
//! The registry performs no I/O itself. Every committed change is first
//! handed to a [`RegistryRepository`] as a single call carrying both the
//! record and the audit entry that describes it; if the repository refuses
//! the write the in-memory state is left untouched.

use crate::audit::AuditEntry;
use crate::error::RegistryResult;
use crate::node::{MeshNode, ServiceProvider};
use std::collections::HashMap;

/// Storage for registry changes.
///
/// Each method is one unit of work: implementations persist the record and
/// its audit entry together or not at all. Audit entries must never be
/// reordered or rewritten.
pub trait RegistryRepository: Send + Sync {
    /// Insert or replace a participant record and append `entry`.
    fn commit_participant(&mut self, node: &MeshNode, entry: &AuditEntry) -> RegistryResult<()>;

    /// Insert a provider record and append `entry`.
    fn commit_provider(
        &mut self,
        provider: &ServiceProvider,
        entry: &AuditEntry,
    ) -> RegistryResult<()>;

    /// Append an audit entry that carries no record change.
    fn commit_audit(&mut self, entry: &AuditEntry) -> RegistryResult<()>;
}

/// Discards every write.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRepository;

impl RegistryRepository for NullRepository {
    fn commit_participant(&mut self, _node: &MeshNode, _entry: &AuditEntry) -> RegistryResult<()> {
        Ok(())
    }

    fn commit_provider(
        &mut self,
        _provider: &ServiceProvider,
        _entry: &AuditEntry,
    ) -> RegistryResult<()> {
        Ok(())
    }

    fn commit_audit(&mut self, _entry: &AuditEntry) -> RegistryResult<()> {
        Ok(())
    }
}

/// Keeps a copy of everything in memory. Useful in tests and as a
/// reference for durable implementations.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRepository {
    participants: HashMap<String, MeshNode>,
    providers: HashMap<String, ServiceProvider>,
    audit: Vec<AuditEntry>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn participant(&self, id: &str) -> Option<&MeshNode> {
        self.participants.get(id)
    }

    pub fn provider(&self, id: &str) -> Option<&ServiceProvider> {
        self.providers.get(id)
    }

    pub fn audit_entries(&self) -> &[AuditEntry] {
        &self.audit
    }
}

impl RegistryRepository for InMemoryRepository {
    fn commit_participant(&mut self, node: &MeshNode, entry: &AuditEntry) -> RegistryResult<()> {
        self.participants.insert(node.id.clone(), node.clone());
        self.audit.push(entry.clone());
        Ok(())
    }

    fn commit_provider(
        &mut self,
        provider: &ServiceProvider,
        entry: &AuditEntry,
    ) -> RegistryResult<()> {
        self.providers.insert(provider.id.clone(), provider.clone());
        self.audit.push(entry.clone());
        Ok(())
    }

    fn commit_audit(&mut self, entry: &AuditEntry) -> RegistryResult<()> {
        self.audit.push(entry.clone());
        Ok(())
    }
}

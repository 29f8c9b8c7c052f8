//! Storage abstraction for register entries.

use std::sync::Mutex;

use super::{RiskEntryPatch, RiskRegisterEntry};
use crate::error::RegisterError;

/// Trait for risk register storage backends.
///
/// The collection is unordered and keyed by `id`; no other uniqueness is
/// enforced. Implementations must be safe to share across threads.
pub trait RiskRepository: Send + Sync {
    /// Store a new entry.
    fn add(&self, entry: RiskRegisterEntry) -> Result<(), RegisterError>;

    /// Merge `patch` into the entry with `id` and return the updated entry.
    /// Returns `None` if no entry matches. `updated_at` is left to the caller.
    fn update(
        &self,
        id: &str,
        patch: RiskEntryPatch,
    ) -> Result<Option<RiskRegisterEntry>, RegisterError>;

    /// Remove and return the entry with `id`.
    fn delete(&self, id: &str) -> Result<Option<RiskRegisterEntry>, RegisterError>;

    /// Look up an entry by `id`.
    fn find(&self, id: &str) -> Result<Option<RiskRegisterEntry>, RegisterError>;

    /// Snapshot of every entry, in storage order.
    fn list(&self) -> Result<Vec<RiskRegisterEntry>, RegisterError>;
}

/// Process-lifetime repository backed by a vector.
#[derive(Debug, Default)]
pub struct InMemoryRiskRepository {
    entries: Mutex<Vec<RiskRegisterEntry>>,
}

impl InMemoryRiskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with `entries`.
    pub fn with_entries(entries: Vec<RiskRegisterEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Apply `f` to the locked entries.
    pub(crate) fn with_lock<T>(
        &self,
        f: impl FnOnce(&mut Vec<RiskRegisterEntry>) -> T,
    ) -> Result<T, RegisterError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| RegisterError::LockPoisoned)?;
        Ok(f(&mut entries))
    }
}

/// Apply `patch` to the entry with `id` inside `entries`.
pub(crate) fn apply_update(
    entries: &mut [RiskRegisterEntry],
    id: &str,
    patch: RiskEntryPatch,
) -> Option<RiskRegisterEntry> {
    let entry = entries.iter_mut().find(|e| e.id == id)?;
    patch.apply_to(entry);
    Some(entry.clone())
}

/// Remove the entry with `id` from `entries`.
pub(crate) fn apply_delete(
    entries: &mut Vec<RiskRegisterEntry>,
    id: &str,
) -> Option<RiskRegisterEntry> {
    let index = entries.iter().position(|e| e.id == id)?;
    Some(entries.remove(index))
}

impl RiskRepository for InMemoryRiskRepository {
    fn add(&self, entry: RiskRegisterEntry) -> Result<(), RegisterError> {
        self.with_lock(|entries| entries.push(entry))
    }

    fn update(
        &self,
        id: &str,
        patch: RiskEntryPatch,
    ) -> Result<Option<RiskRegisterEntry>, RegisterError> {
        self.with_lock(|entries| apply_update(entries, id, patch))
    }

    fn delete(&self, id: &str) -> Result<Option<RiskRegisterEntry>, RegisterError> {
        self.with_lock(|entries| apply_delete(entries, id))
    }

    fn find(&self, id: &str) -> Result<Option<RiskRegisterEntry>, RegisterError> {
        self.with_lock(|entries| entries.iter().find(|e| e.id == id).cloned())
    }

    fn list(&self) -> Result<Vec<RiskRegisterEntry>, RegisterError> {
        self.with_lock(|entries| entries.clone())
    }
}

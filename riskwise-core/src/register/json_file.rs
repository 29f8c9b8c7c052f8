//! JSON-file register backend.
//!
//! The whole register is kept in memory and rewritten atomically (write to a
//! `.tmp` sibling, then rename) after every change.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::repository::{RiskRepository, apply_delete, apply_update};
use super::{RiskEntryPatch, RiskRegisterEntry};
use crate::error::RegisterError;

/// On-disk layout of the register file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RegisterFile {
    risks: Vec<RiskRegisterEntry>,
}

/// Register persisted as a single JSON document.
#[derive(Debug)]
pub struct JsonFileRiskRepository {
    path: PathBuf,
    entries: Mutex<Vec<RiskRegisterEntry>>,
}

impl JsonFileRiskRepository {
    /// Open the register at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RegisterError> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let file: RegisterFile = serde_json::from_str(&content)?;
            file.risks
        } else {
            Vec::new()
        };
        debug!(path = %path.display(), count = entries.len(), "Risk register opened");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<RiskRegisterEntry>>, RegisterError> {
        self.entries.lock().map_err(|_| RegisterError::LockPoisoned)
    }

    fn persist(&self, entries: &[RiskRegisterEntry]) -> Result<(), RegisterError> {
        let file = RegisterFile {
            risks: entries.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        atomic_write(&self.path, json.as_bytes())?;
        debug!(path = %self.path.display(), count = entries.len(), "Risk register saved");
        Ok(())
    }
}

/// Write `data` to a `.tmp` sibling of `path`, then rename over `path`.
fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, path)
}

impl RiskRepository for JsonFileRiskRepository {
    fn add(&self, entry: RiskRegisterEntry) -> Result<(), RegisterError> {
        let mut entries = self.lock()?;
        entries.push(entry);
        self.persist(&entries)
    }

    fn update(
        &self,
        id: &str,
        patch: RiskEntryPatch,
    ) -> Result<Option<RiskRegisterEntry>, RegisterError> {
        let mut entries = self.lock()?;
        let updated = apply_update(&mut entries, id, patch);
        if updated.is_some() {
            self.persist(&entries)?;
        }
        Ok(updated)
    }

    fn delete(&self, id: &str) -> Result<Option<RiskRegisterEntry>, RegisterError> {
        let mut entries = self.lock()?;
        let removed = apply_delete(&mut entries, id);
        if removed.is_some() {
            self.persist(&entries)?;
        }
        Ok(removed)
    }

    fn find(&self, id: &str) -> Result<Option<RiskRegisterEntry>, RegisterError> {
        Ok(self.lock()?.iter().find(|e| e.id == id).cloned())
    }

    fn list(&self) -> Result<Vec<RiskRegisterEntry>, RegisterError> {
        Ok(self.lock()?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::tests::sample_entry;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileRiskRepository::open(dir.path().join("register.json")).unwrap();
        assert!(repo.list().unwrap().is_empty());
        assert!(!repo.path().exists());
    }

    #[test]
    fn test_entries_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("register.json");

        {
            let repo = JsonFileRiskRepository::open(&path).unwrap();
            repo.add(sample_entry("risk_1", "Phishing", 12.0)).unwrap();
            repo.add(sample_entry("risk_2", "DDoS", 4.0)).unwrap();
            repo.update(
                "risk_2",
                RiskEntryPatch {
                    category: Some("Disponibilidad".into()),
                    ..Default::default()
                },
            )
            .unwrap();
            repo.delete("risk_1").unwrap();
        }

        let reopened = JsonFileRiskRepository::open(&path).unwrap();
        let entries = reopened.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "risk_2");
        assert_eq!(entries[0].category, "Disponibilidad");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("register.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonFileRiskRepository::open(&path),
            Err(RegisterError::Serialization(_))
        ));
    }

    #[test]
    fn test_missing_id_does_not_rewrite_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("register.json");
        let repo = JsonFileRiskRepository::open(&path).unwrap();
        assert!(repo.delete("nope").unwrap().is_none());
        assert!(!path.exists());
    }
}

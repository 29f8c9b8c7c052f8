//! # Risk Register
//!
//! Persisted risk records and the service that manages them. Storage is
//! behind the [`RiskRepository`] trait so that the register can run against
//! memory or a JSON file, and the calculation engine never sees it.

mod json_file;
mod repository;

pub use json_file::JsonFileRiskRepository;
pub use repository::{InMemoryRiskRepository, RiskRepository};

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use riskwise_engine::RiskLevel;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{RegisterBackend, RegisterConfig};
use crate::error::{RegisterError, Result, RiskwiseError};
use crate::ids::generate_risk_id;

/// Days until the next review when a new entry does not specify one.
const DEFAULT_REVIEW_INTERVAL_DAYS: i64 = 90;

/// Treatment status of a registered risk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskStatus {
    #[default]
    Open,
    InProgress,
    Mitigated,
    Accepted,
    Transferred,
}

impl RiskStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskStatus::Open => "open",
            RiskStatus::InProgress => "in-progress",
            RiskStatus::Mitigated => "mitigated",
            RiskStatus::Accepted => "accepted",
            RiskStatus::Transferred => "transferred",
        }
    }
}

impl std::fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskStatus {
    type Err = RiskwiseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open" => Ok(RiskStatus::Open),
            "in-progress" => Ok(RiskStatus::InProgress),
            "mitigated" => Ok(RiskStatus::Mitigated),
            "accepted" => Ok(RiskStatus::Accepted),
            "transferred" => Ok(RiskStatus::Transferred),
            other => Err(RiskwiseError::Validation(format!(
                "Estado no válido: {other}"
            ))),
        }
    }
}

/// A persisted risk record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskRegisterEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub asset_name: String,
    pub category: String,
    pub inherent_risk_level: RiskLevel,
    pub residual_risk_level: RiskLevel,
    pub inherent_risk_score: f64,
    pub residual_risk_score: f64,
    pub probability: f64,
    pub impact: f64,
    pub owner: String,
    pub status: RiskStatus,
    pub treatment_plan: String,
    pub controls: Vec<String>,
    pub review_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating an entry. Identifier and timestamps are assigned by
/// the register.
///
/// Levels default to the classification of the matching score, and the
/// review date to ninety days after creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewRiskEntry {
    pub name: String,
    pub description: String,
    pub asset_name: String,
    pub category: String,
    pub inherent_risk_level: Option<RiskLevel>,
    pub residual_risk_level: Option<RiskLevel>,
    pub inherent_risk_score: f64,
    pub residual_risk_score: f64,
    pub probability: f64,
    pub impact: f64,
    pub owner: String,
    pub status: RiskStatus,
    pub treatment_plan: String,
    pub controls: Vec<String>,
    pub review_date: Option<DateTime<Utc>>,
}

impl NewRiskEntry {
    fn into_entry(self, id: String, now: DateTime<Utc>) -> RiskRegisterEntry {
        RiskRegisterEntry {
            id,
            inherent_risk_level: self
                .inherent_risk_level
                .unwrap_or_else(|| RiskLevel::from_score(self.inherent_risk_score)),
            residual_risk_level: self
                .residual_risk_level
                .unwrap_or_else(|| RiskLevel::from_score(self.residual_risk_score)),
            review_date: self
                .review_date
                .unwrap_or(now + Duration::days(DEFAULT_REVIEW_INTERVAL_DAYS)),
            name: self.name,
            description: self.description,
            asset_name: self.asset_name,
            category: self.category,
            inherent_risk_score: self.inherent_risk_score,
            residual_risk_score: self.residual_risk_score,
            probability: self.probability,
            impact: self.impact,
            owner: self.owner,
            status: self.status,
            treatment_plan: self.treatment_plan,
            controls: self.controls,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update. `None` fields are left untouched; the identifier and
/// creation time cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskEntryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub asset_name: Option<String>,
    pub category: Option<String>,
    pub inherent_risk_level: Option<RiskLevel>,
    pub residual_risk_level: Option<RiskLevel>,
    pub inherent_risk_score: Option<f64>,
    pub residual_risk_score: Option<f64>,
    pub probability: Option<f64>,
    pub impact: Option<f64>,
    pub owner: Option<String>,
    pub status: Option<RiskStatus>,
    pub treatment_plan: Option<String>,
    pub controls: Option<Vec<String>>,
    pub review_date: Option<DateTime<Utc>>,
    /// Set by the register when the patch is applied.
    #[serde(skip)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RiskEntryPatch {
    /// Merge this patch into `entry`.
    pub fn apply_to(self, entry: &mut RiskRegisterEntry) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }
        set(&mut entry.name, self.name);
        set(&mut entry.description, self.description);
        set(&mut entry.asset_name, self.asset_name);
        set(&mut entry.category, self.category);
        set(&mut entry.inherent_risk_level, self.inherent_risk_level);
        set(&mut entry.residual_risk_level, self.residual_risk_level);
        set(&mut entry.inherent_risk_score, self.inherent_risk_score);
        set(&mut entry.residual_risk_score, self.residual_risk_score);
        set(&mut entry.probability, self.probability);
        set(&mut entry.impact, self.impact);
        set(&mut entry.owner, self.owner);
        set(&mut entry.status, self.status);
        set(&mut entry.treatment_plan, self.treatment_plan);
        set(&mut entry.controls, self.controls);
        set(&mut entry.review_date, self.review_date);
        set(&mut entry.updated_at, self.updated_at);
    }
}

/// Filters for listing register entries. All present filters must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskFilter {
    /// Case-insensitive substring of name, description or asset name.
    pub search: Option<String>,
    /// Exact status wire name, e.g. `in-progress`.
    pub status: Option<String>,
    /// Exact category.
    pub category: Option<String>,
}

impl RiskFilter {
    /// Whether `entry` passes every filter.
    pub fn matches(&self, entry: &RiskRegisterEntry) -> bool {
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            let found = [&entry.name, &entry.description, &entry.asset_name]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !found {
                return false;
            }
        }
        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty())
            && entry.status.as_str() != status
        {
            return false;
        }
        if let Some(category) = self.category.as_deref().filter(|s| !s.is_empty())
            && entry.category != category
        {
            return false;
        }
        true
    }
}

/// Order entries by residual risk score, highest first.
pub fn sort_by_residual_score(entries: &mut [RiskRegisterEntry]) {
    entries.sort_by(|a, b| {
        b.residual_risk_score
            .partial_cmp(&a.residual_risk_score)
            .unwrap_or(Ordering::Equal)
    });
}

/// Open the repository selected by `config`.
pub fn open_repository(
    config: &RegisterConfig,
    workspace: &Path,
) -> std::result::Result<Arc<dyn RiskRepository>, RegisterError> {
    match config.backend {
        RegisterBackend::Memory => Ok(Arc::new(InMemoryRiskRepository::new())),
        RegisterBackend::Json => Ok(Arc::new(JsonFileRiskRepository::open(
            config.resolve_path(workspace),
        )?)),
    }
}

/// Register service: validation, identifiers, timestamps and listing rules
/// on top of a [`RiskRepository`].
#[derive(Clone)]
pub struct RiskRegister {
    repository: Arc<dyn RiskRepository>,
}

impl std::fmt::Debug for RiskRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskRegister").finish_non_exhaustive()
    }
}

impl RiskRegister {
    pub fn new(repository: Arc<dyn RiskRepository>) -> Self {
        Self { repository }
    }

    /// Register backed by a fresh in-memory repository.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRiskRepository::new()))
    }

    /// Create an entry with a generated identifier.
    pub fn create(&self, new_entry: NewRiskEntry) -> Result<RiskRegisterEntry> {
        if new_entry.name.trim().is_empty()
            || new_entry.asset_name.trim().is_empty()
            || new_entry.category.trim().is_empty()
        {
            warn!("Risk creation rejected: missing required fields");
            return Err(RiskwiseError::Validation(
                "Campos requeridos faltantes: nombre, activo y categoría son obligatorios"
                    .to_string(),
            ));
        }

        let entry = new_entry.into_entry(generate_risk_id(), Utc::now());
        self.repository.add(entry.clone())?;
        info!(id = %entry.id, name = %entry.name, "Risk created");
        Ok(entry)
    }

    /// Fetch an entry by identifier.
    pub fn get(&self, id: &str) -> Result<RiskRegisterEntry> {
        self.repository.find(id)?.ok_or_else(|| not_found(id))
    }

    /// Merge `patch` into an entry and refresh its update time.
    pub fn update(&self, id: &str, mut patch: RiskEntryPatch) -> Result<RiskRegisterEntry> {
        patch.updated_at = Some(Utc::now());
        let updated = self
            .repository
            .update(id, patch)?
            .ok_or_else(|| not_found(id))?;
        info!(id = %id, "Risk updated");
        Ok(updated)
    }

    /// Remove an entry, returning it.
    pub fn delete(&self, id: &str) -> Result<RiskRegisterEntry> {
        let removed = self.repository.delete(id)?.ok_or_else(|| not_found(id))?;
        info!(id = %id, "Risk deleted");
        Ok(removed)
    }

    /// Entries passing `filter`, highest residual score first.
    pub fn list(&self, filter: &RiskFilter) -> Result<Vec<RiskRegisterEntry>> {
        let mut entries: Vec<RiskRegisterEntry> = self
            .repository
            .list()?
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect();
        sort_by_residual_score(&mut entries);
        Ok(entries)
    }

    /// Every entry, highest residual score first.
    pub fn all(&self) -> Result<Vec<RiskRegisterEntry>> {
        self.list(&RiskFilter::default())
    }
}

fn not_found(id: &str) -> RiskwiseError {
    warn!(id = %id, "Risk not found");
    RiskwiseError::NotFound("Riesgo no encontrado".to_string())
}

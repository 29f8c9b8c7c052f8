//! Register export to CSV or JSON documents.
//!
//! Entries are optionally filtered by creation date, ordered by residual
//! score (highest first) and rendered into a downloadable document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, RiskwiseError};
use crate::register::{RiskRegisterEntry, sort_by_residual_score};

const INVALID_FORMAT: &str = "Formato de exportación no válido. Use \"csv\" o \"json\"";

const CSV_HEADERS: [&str; 18] = [
    "ID",
    "Nombre",
    "Descripción",
    "Activo",
    "Categoría",
    "Nivel de Riesgo Inherente",
    "Nivel de Riesgo Residual",
    "Puntuación Riesgo Inherente",
    "Puntuación Riesgo Residual",
    "Probabilidad",
    "Impacto",
    "Propietario",
    "Estado",
    "Plan de Tratamiento",
    "Controles",
    "Fecha de Revisión",
    "Fecha de Creación",
    "Fecha de Actualización",
];

/// Output document format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    #[default]
    Json,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = RiskwiseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(invalid_format()),
        }
    }
}

/// Error for a missing or unrecognized export format.
pub(crate) fn invalid_format() -> RiskwiseError {
    RiskwiseError::Validation(INVALID_FORMAT.to_string())
}

/// Inclusive creation-date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant <= self.to
    }
}

/// What to export and how.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    pub format: ExportFormat,
    #[serde(default)]
    pub include_calculations: bool,
    #[serde(default)]
    pub include_recommendations: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

/// A rendered export ready to be written or served.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    pub content: String,
    pub content_type: &'static str,
    pub filename: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonEnvelope<'a> {
    exported_at: DateTime<Utc>,
    total_risks: usize,
    include_calculations: bool,
    include_recommendations: bool,
    risks: &'a [RiskRegisterEntry],
}

/// Keep entries whose creation time falls inside `range`.
pub fn filter_by_date_range(
    entries: Vec<RiskRegisterEntry>,
    range: Option<&DateRange>,
) -> Vec<RiskRegisterEntry> {
    match range {
        Some(range) => entries
            .into_iter()
            .filter(|e| range.contains(e.created_at))
            .collect(),
        None => entries,
    }
}

/// Render `entries` according to `options`. `now` stamps the document and
/// its filename.
pub fn export(
    entries: Vec<RiskRegisterEntry>,
    options: &ExportOptions,
    now: DateTime<Utc>,
) -> Result<ExportDocument> {
    let mut entries = filter_by_date_range(entries, options.date_range.as_ref());
    sort_by_residual_score(&mut entries);

    let content = match options.format {
        ExportFormat::Csv => to_csv(&entries),
        ExportFormat::Json => serde_json::to_string_pretty(&JsonEnvelope {
            exported_at: now,
            total_risks: entries.len(),
            include_calculations: options.include_calculations,
            include_recommendations: options.include_recommendations,
            risks: &entries,
        })?,
    };

    info!(
        format = %options.format,
        count = entries.len(),
        "Risk register exported"
    );

    Ok(ExportDocument {
        content,
        content_type: options.format.content_type(),
        filename: format!(
            "registro-riesgos-{}.{}",
            now.format("%Y-%m-%d"),
            options.format.extension()
        ),
    })
}

/// CSV with a Spanish header row. Empty input renders as an empty document.
pub fn to_csv(entries: &[RiskRegisterEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(entries.len() + 1);
    lines.push(CSV_HEADERS.join(","));
    for e in entries {
        let row = [
            escape_csv(&e.id),
            quote_csv(&e.name),
            quote_csv(&e.description),
            quote_csv(&e.asset_name),
            escape_csv(&e.category),
            e.inherent_risk_level.label().to_string(),
            e.residual_risk_level.label().to_string(),
            e.inherent_risk_score.to_string(),
            e.residual_risk_score.to_string(),
            e.probability.to_string(),
            e.impact.to_string(),
            quote_csv(&e.owner),
            e.status.to_string(),
            quote_csv(&e.treatment_plan),
            quote_csv(&e.controls.join("; ")),
            format_date(e.review_date),
            format_date(e.created_at),
            format_date(e.updated_at),
        ];
        lines.push(row.join(","));
    }
    lines.join("\n")
}

fn format_date(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d").to_string()
}

/// Always quote free text.
fn quote_csv(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Quote only when the value would break the row.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        quote_csv(s)
    } else {
        s.to_string()
    }
}

//! Risk level classification and risk-matrix helpers.

use serde::{Deserialize, Serialize};

/// Risk level band, ordered from least to most severe.
///
/// Serialized with the labels used across the register and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Score 0-5.
    #[serde(rename = "Muy Bajo")]
    VeryLow,
    /// Score above 5 up to 10.
    #[serde(rename = "Bajo")]
    Low,
    /// Score above 10 up to 15.
    #[serde(rename = "Medio")]
    Medium,
    /// Score above 15 up to 20.
    #[serde(rename = "Alto")]
    High,
    /// Score above 20.
    #[serde(rename = "Crítico")]
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl RiskLevel {
    /// All levels in ascending severity.
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::VeryLow,
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Classify a score into a risk level. Upper bounds are inclusive.
    pub fn from_score(score: f64) -> Self {
        if score <= 5.0 {
            RiskLevel::VeryLow
        } else if score <= 10.0 {
            RiskLevel::Low
        } else if score <= 15.0 {
            RiskLevel::Medium
        } else if score <= 20.0 {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }

    /// Level for a matrix band index (1 = lowest, 5 = highest).
    pub fn from_matrix_rank(rank: u8) -> Option<Self> {
        match rank {
            1..=5 => Some(Self::ALL[usize::from(rank - 1)]),
            _ => None,
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "Muy Bajo",
            RiskLevel::Low => "Bajo",
            RiskLevel::Medium => "Medio",
            RiskLevel::High => "Alto",
            RiskLevel::Critical => "Crítico",
        }
    }

    /// Hex colour used when rendering the level.
    pub fn color(&self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "#22c55e",
            RiskLevel::Low => "#84cc16",
            RiskLevel::Medium => "#eab308",
            RiskLevel::High => "#f97316",
            RiskLevel::Critical => "#ef4444",
        }
    }
}

/// Score of a 5×5 matrix cell. Both axes are rounded and clamped into 1..=5.
pub fn matrix_cell_score(likelihood: f64, impact: f64) -> u32 {
    clamp_axis(likelihood) * clamp_axis(impact)
}

/// Risk level of a 5×5 matrix cell.
pub fn matrix_cell_level(likelihood: f64, impact: f64) -> RiskLevel {
    RiskLevel::from_score(f64::from(matrix_cell_score(likelihood, impact)))
}

fn clamp_axis(value: f64) -> u32 {
    value.round().clamp(1.0, 5.0) as u32
}

/// Severity label for a CVSS-like 1-10 vulnerability score.
pub fn cvss_severity_label(severity: f64) -> &'static str {
    match severity.round().clamp(1.0, 10.0) as u8 {
        1 | 2 => "Informacional",
        3 | 4 => "Bajo",
        5 | 6 => "Medio",
        7 | 8 => "Alto",
        _ => "Crítico",
    }
}

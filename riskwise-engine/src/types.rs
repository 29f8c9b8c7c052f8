//! Input and result types shared by both calculation methods.

use serde::{Deserialize, Serialize};

use crate::level::RiskLevel;

/// Which methodology a calculation uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationMethod {
    /// Likelihood × impact matrix.
    #[default]
    Qualitative,
    /// Monetary loss expectancy.
    Quantitative,
}

impl std::fmt::Display for CalculationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalculationMethod::Qualitative => write!(f, "qualitative"),
            CalculationMethod::Quantitative => write!(f, "quantitative"),
        }
    }
}

/// CIA-triad impact ratings for an asset, each on a 1-5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactAssessment {
    pub confidentiality: u8,
    pub integrity: u8,
    pub availability: u8,
}

impl ImpactAssessment {
    /// Worst dimension wins.
    pub fn overall(&self) -> u8 {
        self.confidentiality.max(self.integrity).max(self.availability)
    }
}

/// Raw factors for likelihood × impact scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualitativeInput {
    /// 1-5 scale.
    pub likelihood: f64,
    /// 1-5 scale.
    pub impact: f64,
    /// 1-10 scale (CVSS-like).
    pub vulnerability_severity: f64,
    /// 0-100 percent.
    pub control_effectiveness: f64,
    /// 1-5 scale.
    pub detection_capability: f64,
    /// 1-5 scale.
    pub response_capability: f64,
}

/// Raw factors for loss-expectancy scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantitativeInput {
    /// Monetary value of the asset.
    pub asset_value: f64,
    /// Fraction of the asset value lost per event (0-1).
    pub exposure_factor: f64,
    /// Expected loss events per year.
    pub annual_rate_of_occurrence: f64,
    /// 0-100 percent.
    pub control_effectiveness: f64,
    /// 1-5 scale.
    pub detection_capability: f64,
    /// 1-5 scale.
    pub response_capability: f64,
}

/// A cell on the 5×5 risk matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixCoordinate {
    pub likelihood: i32,
    pub impact: i32,
}

/// Matrix cells before and after controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixPosition {
    pub inherent: MatrixCoordinate,
    pub residual: MatrixCoordinate,
}

/// Result of a qualitative calculation. Scores and reduction are rounded to 2 dp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualitativeResult {
    pub inherent_risk_score: f64,
    pub residual_risk_score: f64,
    pub inherent_risk_level: RiskLevel,
    pub residual_risk_level: RiskLevel,
    /// Percentage of inherent risk removed by controls.
    pub risk_reduction: f64,
    pub matrix_position: MatrixPosition,
}

/// Result of a quantitative calculation. All values are rounded to 2 dp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantitativeResult {
    /// SLE.
    pub single_loss_expectancy: f64,
    /// ALE; always equal to `inherent_ale`.
    pub annual_loss_expectancy: f64,
    #[serde(rename = "inherentALE")]
    pub inherent_ale: f64,
    #[serde(rename = "residualALE")]
    pub residual_ale: f64,
    pub cost_avoidance: f64,
    /// ROSI, as a percentage.
    pub return_on_security_investment: f64,
}

impl QuantitativeResult {
    /// Whether every figure is a finite number.
    pub fn is_finite(&self) -> bool {
        [
            self.single_loss_expectancy,
            self.annual_loss_expectancy,
            self.inherent_ale,
            self.residual_ale,
            self.cost_avoidance,
            self.return_on_security_investment,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

impl QualitativeResult {
    /// Whether every score is a finite number.
    pub fn is_finite(&self) -> bool {
        self.inherent_risk_score.is_finite()
            && self.residual_risk_score.is_finite()
            && self.risk_reduction.is_finite()
    }
}

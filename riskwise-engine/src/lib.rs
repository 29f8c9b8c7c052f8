//! # Riskwise Engine
//!
//! Pure calculation engine for cybersecurity risk scoring.
//!
//! - **Qualitative** (ISO 27005 style): likelihood × impact with vulnerability
//!   severity adjustment, producing inherent/residual scores, levels and
//!   risk-matrix coordinates.
//! - **Quantitative** (NIST SP 800-30 style): single and annual loss
//!   expectancy, residual loss, cost avoidance and return on security
//!   investment.
//! - **Recommendations**: ordered guidance derived from either result.
//!
//! Every function in this crate is synchronous and side-effect free.

pub mod effectiveness;
pub mod level;
pub mod qualitative;
pub mod quantitative;
pub mod recommendations;
pub mod types;

pub use effectiveness::{apply_control_effectiveness, enhanced_effectiveness};
pub use level::{RiskLevel, cvss_severity_label, matrix_cell_level, matrix_cell_score};
pub use qualitative::calculate_qualitative;
pub use quantitative::{ESTIMATED_CONTROL_COST_RATIO, calculate_quantitative};
pub use recommendations::generate_recommendations;
pub use types::{
    CalculationMethod, ImpactAssessment, MatrixCoordinate, MatrixPosition, QualitativeInput,
    QualitativeResult, QuantitativeInput, QuantitativeResult,
};

/// Round to two decimal places, halves away from zero.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

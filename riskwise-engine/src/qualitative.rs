//! Qualitative risk calculation (likelihood × impact, ISO 27005 style).

use crate::effectiveness::{apply_control_effectiveness, enhanced_effectiveness};
use crate::level::RiskLevel;
use crate::round2;
use crate::types::{
    ImpactAssessment, MatrixCoordinate, MatrixPosition, QualitativeInput, QualitativeResult,
};

/// Upper bound of the likelihood and impact scales.
const SCALE_MAX: f64 = 5.0;

/// Calculate inherent and residual qualitative risk.
///
/// Likelihood is nudged upward by vulnerability severity (a 10 adds two
/// points) and capped at 5. Impact is the worst of the declared impact and
/// the CIA assessment. The residual matrix cell only moves along the
/// likelihood axis; its impact coordinate stays at the inherent value, and
/// its likelihood is not clamped, so it may round to 0.
///
/// Precondition: likelihood and every impact figure are at least 1. An
/// inherent score of 0 makes `risk_reduction` NaN.
pub fn calculate_qualitative(
    input: &QualitativeInput,
    impact_assessment: &ImpactAssessment,
) -> QualitativeResult {
    let overall_impact = input.impact.max(f64::from(impact_assessment.overall()));
    let adjusted_likelihood =
        (input.likelihood + (input.vulnerability_severity / 10.0) * 2.0).min(SCALE_MAX);

    let inherent_risk_score = adjusted_likelihood * overall_impact;

    let effectiveness = enhanced_effectiveness(
        input.control_effectiveness,
        input.detection_capability,
        input.response_capability,
    );
    let residual_risk_score = apply_control_effectiveness(inherent_risk_score, effectiveness);

    let risk_reduction =
        (inherent_risk_score - residual_risk_score) / inherent_risk_score * 100.0;

    let impact_coordinate = overall_impact.round() as i32;
    let matrix_position = MatrixPosition {
        inherent: MatrixCoordinate {
            likelihood: adjusted_likelihood.round() as i32,
            impact: impact_coordinate,
        },
        residual: MatrixCoordinate {
            likelihood: (adjusted_likelihood * (1.0 - effectiveness / 100.0)).round() as i32,
            impact: impact_coordinate,
        },
    };

    QualitativeResult {
        inherent_risk_score: round2(inherent_risk_score),
        residual_risk_score: round2(residual_risk_score),
        inherent_risk_level: RiskLevel::from_score(inherent_risk_score),
        residual_risk_level: RiskLevel::from_score(residual_risk_score),
        risk_reduction: round2(risk_reduction),
        matrix_position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn input(
        likelihood: f64,
        impact: f64,
        vulnerability_severity: f64,
        control_effectiveness: f64,
        detection_capability: f64,
        response_capability: f64,
    ) -> QualitativeInput {
        QualitativeInput {
            likelihood,
            impact,
            vulnerability_severity,
            control_effectiveness,
            detection_capability,
            response_capability,
        }
    }

    fn cia(c: u8, i: u8, a: u8) -> ImpactAssessment {
        ImpactAssessment {
            confidentiality: c,
            integrity: i,
            availability: a,
        }
    }

    #[test]
    fn test_reference_scenario() {
        let result = calculate_qualitative(&input(3.0, 3.0, 5.0, 50.0, 3.0, 3.0), &cia(3, 3, 3));

        assert_eq!(
            result,
            QualitativeResult {
                inherent_risk_score: 12.0,
                residual_risk_score: 3.6,
                inherent_risk_level: RiskLevel::Medium,
                residual_risk_level: RiskLevel::VeryLow,
                risk_reduction: 70.0,
                matrix_position: MatrixPosition {
                    inherent: MatrixCoordinate {
                        likelihood: 4,
                        impact: 3
                    },
                    residual: MatrixCoordinate {
                        likelihood: 1,
                        impact: 3
                    },
                },
            }
        );
    }

    #[test]
    fn test_cia_assessment_overrides_lower_impact() {
        let result = calculate_qualitative(&input(2.0, 1.0, 0.0, 0.0, 1.0, 1.0), &cia(1, 5, 2));
        assert_eq!(result.inherent_risk_score, 10.0);
        assert_eq!(result.matrix_position.inherent.impact, 5);
    }

    #[test]
    fn test_declared_impact_overrides_lower_assessment() {
        let result = calculate_qualitative(&input(2.0, 4.0, 0.0, 0.0, 1.0, 1.0), &cia(1, 1, 1));
        assert_eq!(result.inherent_risk_score, 8.0);
        assert_eq!(result.inherent_risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_adjusted_likelihood_capped_at_five() {
        let result = calculate_qualitative(&input(5.0, 5.0, 10.0, 0.0, 1.0, 1.0), &cia(5, 5, 5));
        assert_eq!(result.inherent_risk_score, 25.0);
        assert_eq!(result.inherent_risk_level, RiskLevel::Critical);
        assert_eq!(result.residual_risk_level, RiskLevel::Critical);
        assert_eq!(result.risk_reduction, 0.0);
        assert_eq!(result.matrix_position.inherent.likelihood, 5);
    }

    #[test]
    fn test_fractional_severity_adjustment() {
        // 2 + 7/10 * 2 = 3.4
        let result = calculate_qualitative(&input(2.0, 3.0, 7.0, 0.0, 1.0, 1.0), &cia(1, 1, 1));
        assert_eq!(result.inherent_risk_score, 10.2);
        assert_eq!(result.inherent_risk_level, RiskLevel::Medium);
        assert_eq!(result.matrix_position.inherent.likelihood, 3);
    }

    #[test]
    fn test_residual_impact_coordinate_not_reduced() {
        let result = calculate_qualitative(&input(4.0, 4.0, 5.0, 80.0, 2.0, 2.0), &cia(4, 4, 4));
        assert_eq!(
            result.matrix_position.residual.impact,
            result.matrix_position.inherent.impact
        );
        assert!(
            result.matrix_position.residual.likelihood
                < result.matrix_position.inherent.likelihood
        );
    }

    #[test]
    fn test_full_effectiveness_residual_likelihood_reaches_zero() {
        let result = calculate_qualitative(&input(3.0, 3.0, 5.0, 95.0, 5.0, 5.0), &cia(3, 3, 3));
        assert_eq!(result.residual_risk_score, 0.0);
        assert_eq!(result.risk_reduction, 100.0);
        assert_eq!(result.matrix_position.residual.likelihood, 0);
    }

    #[test]
    fn test_high_residual_when_controls_weak() {
        let result = calculate_qualitative(&input(4.0, 5.0, 8.0, 10.0, 1.0, 1.0), &cia(5, 4, 4));
        assert_eq!(result.inherent_risk_score, 25.0);
        assert_eq!(result.residual_risk_score, 22.5);
        assert_eq!(result.residual_risk_level, RiskLevel::Critical);
        assert_eq!(result.risk_reduction, 10.0);
    }

    #[test]
    fn test_is_idempotent() {
        let i = input(3.0, 2.0, 6.5, 33.3, 2.0, 4.0);
        let impact = cia(2, 3, 4);
        assert_eq!(
            calculate_qualitative(&i, &impact),
            calculate_qualitative(&i, &impact)
        );
    }
}

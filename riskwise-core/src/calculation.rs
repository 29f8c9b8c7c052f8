//! Calculation service. Validates a request, runs the matching engine and
//! packages the result with its recommendations.

use chrono::{DateTime, Utc};
use riskwise_engine::{
    CalculationMethod, ImpactAssessment, QualitativeInput, QualitativeResult, QuantitativeInput,
    QuantitativeResult, calculate_qualitative, calculate_quantitative, generate_recommendations,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::CalculationConfig;
use crate::error::{Result, RiskwiseError};
use crate::ids::generate_risk_id;

/// Direction of a risk over time.
///
/// Historical analysis is not performed; results are always `Stable`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTrend {
    Increasing,
    #[default]
    Stable,
    Decreasing,
}

/// A calculation request.
///
/// `method` and `impact_assessment` are optional here so that a missing
/// field surfaces as a validation error rather than a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskCalculationInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub asset_name: String,
    pub threat_description: String,
    pub vulnerability_description: String,
    pub method: Option<CalculationMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualitative_data: Option<QualitativeInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantitative_data: Option<QuantitativeInput>,
    pub impact_assessment: Option<ImpactAssessment>,
    pub existing_controls: Vec<String>,
    pub proposed_controls: Vec<String>,
}

/// The outcome of one calculation request. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskCalculationResult {
    pub id: String,
    pub input: RiskCalculationInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualitative_result: Option<QualitativeResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantitative_result: Option<QuantitativeResult>,
    pub recommended_actions: Vec<String>,
    pub calculated_at: DateTime<Utc>,
    pub risk_trend: RiskTrend,
}

/// Engine output for a validated request.
enum EngineOutput {
    Qualitative(QualitativeResult),
    Quantitative(QuantitativeResult),
}

/// Runs calculation requests against the engine.
#[derive(Debug, Clone, Default)]
pub struct RiskCalculationService {
    config: CalculationConfig,
}

impl RiskCalculationService {
    pub fn new(config: CalculationConfig) -> Self {
        Self { config }
    }

    /// Validate `input`, run the engine for its method and attach
    /// recommendations.
    pub fn calculate(&self, mut input: RiskCalculationInput) -> Result<RiskCalculationResult> {
        debug!(
            name = %input.name,
            method = ?input.method,
            has_qualitative_data = input.qualitative_data.is_some(),
            has_quantitative_data = input.quantitative_data.is_some(),
            "Risk calculation requested"
        );

        let (method, impact) = match (input.method, input.impact_assessment) {
            (Some(method), Some(impact)) if !input.name.trim().is_empty() => (method, impact),
            _ => {
                warn!(name = %input.name, "Calculation rejected: missing required fields");
                return Err(RiskwiseError::Validation(
                    "Campos requeridos faltantes".to_string(),
                ));
            }
        };

        let output = match method {
            CalculationMethod::Qualitative => {
                let data = input.qualitative_data.ok_or_else(|| {
                    warn!(name = %input.name, "Calculation rejected: missing qualitative data");
                    RiskwiseError::Validation(
                        "Datos cualitativos requeridos para el método cualitativo".to_string(),
                    )
                })?;
                if self.config.enforce_input_ranges {
                    validate_qualitative_ranges(&data, &impact)?;
                }
                EngineOutput::Qualitative(calculate_qualitative(&data, &impact))
            }
            CalculationMethod::Quantitative => {
                let data = input.quantitative_data.ok_or_else(|| {
                    warn!(name = %input.name, "Calculation rejected: missing quantitative data");
                    RiskwiseError::Validation(
                        "Datos cuantitativos requeridos para el método cuantitativo".to_string(),
                    )
                })?;
                if self.config.enforce_input_ranges {
                    validate_quantitative_ranges(&data, &impact)?;
                }
                EngineOutput::Quantitative(calculate_quantitative(&data))
            }
        };

        let (qualitative_result, quantitative_result) = match output {
            EngineOutput::Qualitative(result) => {
                if !result.is_finite() {
                    error!(name = %input.name, ?result, "Qualitative result is not finite");
                    return Err(RiskwiseError::Computation(
                        "el puntaje de riesgo inherente es cero; probabilidad e impacto deben ser al menos 1"
                            .to_string(),
                    ));
                }
                info!(
                    name = %input.name,
                    inherent_score = result.inherent_risk_score,
                    residual_score = result.residual_risk_score,
                    residual_level = %result.residual_risk_level,
                    "Qualitative risk calculated"
                );
                (Some(result), None)
            }
            EngineOutput::Quantitative(result) => {
                if !result.is_finite() {
                    error!(name = %input.name, ?result, "Quantitative result is not finite");
                    return Err(RiskwiseError::Computation(
                        "la pérdida esperada no es un número finito".to_string(),
                    ));
                }
                info!(
                    name = %input.name,
                    sle = result.single_loss_expectancy,
                    ale = result.annual_loss_expectancy,
                    rosi = result.return_on_security_investment,
                    "Quantitative risk calculated"
                );
                (None, Some(result))
            }
        };

        let recommended_actions = generate_recommendations(
            qualitative_result.as_ref(),
            quantitative_result.as_ref(),
            method,
        );
        debug!(count = recommended_actions.len(), "Recommendations generated");

        let id = input.id.clone().unwrap_or_else(generate_risk_id);
        input.id = Some(id.clone());

        Ok(RiskCalculationResult {
            id,
            input,
            qualitative_result,
            quantitative_result,
            recommended_actions,
            calculated_at: Utc::now(),
            risk_trend: RiskTrend::Stable,
        })
    }

    /// Calculate several independent requests. Results follow input order.
    pub fn calculate_batch(
        &self,
        inputs: Vec<RiskCalculationInput>,
    ) -> Vec<Result<RiskCalculationResult>> {
        inputs
            .into_iter()
            .map(|input| self.calculate(input))
            .collect()
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(RiskwiseError::Validation(format!(
            "{field} fuera de rango: {value} (permitido {min}-{max})"
        )))
    }
}

fn check_min(field: &str, value: f64, min: f64) -> Result<()> {
    if value >= min {
        Ok(())
    } else {
        Err(RiskwiseError::Validation(format!(
            "{field} fuera de rango: {value} (mínimo {min})"
        )))
    }
}

fn validate_impact_ranges(impact: &ImpactAssessment) -> Result<()> {
    check_range("confidentiality", f64::from(impact.confidentiality), 1.0, 5.0)?;
    check_range("integrity", f64::from(impact.integrity), 1.0, 5.0)?;
    check_range("availability", f64::from(impact.availability), 1.0, 5.0)
}

fn validate_qualitative_ranges(data: &QualitativeInput, impact: &ImpactAssessment) -> Result<()> {
    validate_impact_ranges(impact)?;
    check_range("likelihood", data.likelihood, 1.0, 5.0)?;
    check_range("impact", data.impact, 1.0, 5.0)?;
    check_range("vulnerabilitySeverity", data.vulnerability_severity, 1.0, 10.0)?;
    check_range("controlEffectiveness", data.control_effectiveness, 0.0, 100.0)?;
    check_range("detectionCapability", data.detection_capability, 1.0, 5.0)?;
    check_range("responseCapability", data.response_capability, 1.0, 5.0)
}

fn validate_quantitative_ranges(data: &QuantitativeInput, impact: &ImpactAssessment) -> Result<()> {
    validate_impact_ranges(impact)?;
    check_min("assetValue", data.asset_value, 0.0)?;
    check_range("exposureFactor", data.exposure_factor, 0.0, 1.0)?;
    check_min("annualRateOfOccurrence", data.annual_rate_of_occurrence, 0.0)?;
    check_range("controlEffectiveness", data.control_effectiveness, 0.0, 100.0)?;
    check_range("detectionCapability", data.detection_capability, 1.0, 5.0)?;
    check_range("responseCapability", data.response_capability, 1.0, 5.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use riskwise_engine::RiskLevel;

    fn impact() -> ImpactAssessment {
        ImpactAssessment {
            confidentiality: 3,
            integrity: 3,
            availability: 3,
        }
    }

    fn qualitative_input() -> RiskCalculationInput {
        RiskCalculationInput {
            name: "Ransomware en servidores de archivos".into(),
            description: "Cifrado malicioso de recursos compartidos".into(),
            asset_name: "Servidor de archivos".into(),
            threat_description: "Ransomware".into(),
            vulnerability_description: "SMB expuesto".into(),
            method: Some(CalculationMethod::Qualitative),
            qualitative_data: Some(QualitativeInput {
                likelihood: 3.0,
                impact: 3.0,
                vulnerability_severity: 5.0,
                control_effectiveness: 50.0,
                detection_capability: 3.0,
                response_capability: 3.0,
            }),
            impact_assessment: Some(impact()),
            existing_controls: vec!["Copias de seguridad".into()],
            ..Default::default()
        }
    }

    fn quantitative_input() -> RiskCalculationInput {
        RiskCalculationInput {
            name: "Fuga de base de datos".into(),
            method: Some(CalculationMethod::Quantitative),
            quantitative_data: Some(QuantitativeInput {
                asset_value: 100_000.0,
                exposure_factor: 0.5,
                annual_rate_of_occurrence: 1.0,
                control_effectiveness: 50.0,
                detection_capability: 3.0,
                response_capability: 3.0,
            }),
            impact_assessment: Some(impact()),
            ..Default::default()
        }
    }

    #[test]
    fn test_qualitative_calculation() {
        let service = RiskCalculationService::default();
        let result = service.calculate(qualitative_input()).unwrap();

        let qual = result.qualitative_result.as_ref().unwrap();
        assert_eq!(qual.inherent_risk_score, 12.0);
        assert_eq!(qual.residual_risk_score, 3.6);
        assert_eq!(qual.residual_risk_level, RiskLevel::VeryLow);
        assert!(result.quantitative_result.is_none());
        assert_eq!(result.recommended_actions.len(), 2);
        assert_eq!(result.risk_trend, RiskTrend::Stable);
        assert_eq!(result.input.id.as_deref(), Some(result.id.as_str()));
        assert!(result.id.starts_with("risk_"));
    }

    #[test]
    fn test_quantitative_calculation() {
        let service = RiskCalculationService::default();
        let result = service.calculate(quantitative_input()).unwrap();

        let quant = result.quantitative_result.as_ref().unwrap();
        assert_eq!(quant.return_on_security_investment, 900.0);
        assert!(result.qualitative_result.is_none());
        assert_eq!(
            result.recommended_actions[0],
            "Excelente ROI en controles de seguridad - continuar inversión"
        );
        assert_eq!(result.recommended_actions.len(), 3);
    }

    #[test]
    fn test_provided_id_is_kept() {
        let service = RiskCalculationService::default();
        let mut input = qualitative_input();
        input.id = Some("risk_custom".into());
        let result = service.calculate(input).unwrap();
        assert_eq!(result.id, "risk_custom");
    }

    #[test]
    fn test_missing_required_fields() {
        let service = RiskCalculationService::default();

        let mut no_name = qualitative_input();
        no_name.name = "   ".into();
        let mut no_method = qualitative_input();
        no_method.method = None;
        let mut no_impact = qualitative_input();
        no_impact.impact_assessment = None;

        for input in [no_name, no_method, no_impact] {
            match service.calculate(input) {
                Err(RiskwiseError::Validation(msg)) => {
                    assert_eq!(msg, "Campos requeridos faltantes")
                }
                other => panic!("Expected validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_method_data_mismatch() {
        let service = RiskCalculationService::default();

        let mut input = qualitative_input();
        input.method = Some(CalculationMethod::Quantitative);
        let err = service.calculate(input).unwrap_err();
        assert!(err.client_message().contains("cuantitativos"));

        let mut input = quantitative_input();
        input.method = Some(CalculationMethod::Qualitative);
        let err = service.calculate(input).unwrap_err();
        assert!(err.client_message().contains("cualitativos"));
    }

    #[test]
    fn test_zero_inherent_score_is_computation_error() {
        let service = RiskCalculationService::default();
        let mut input = qualitative_input();
        input.qualitative_data = Some(QualitativeInput {
            likelihood: 0.0,
            impact: 0.0,
            vulnerability_severity: 0.0,
            control_effectiveness: 50.0,
            detection_capability: 1.0,
            response_capability: 1.0,
        });
        input.impact_assessment = Some(ImpactAssessment {
            confidentiality: 0,
            integrity: 0,
            availability: 0,
        });
        assert!(matches!(
            service.calculate(input),
            Err(RiskwiseError::Computation(_))
        ));
    }

    #[test]
    fn test_ranges_not_enforced_by_default() {
        let service = RiskCalculationService::default();
        let mut input = qualitative_input();
        if let Some(data) = input.qualitative_data.as_mut() {
            data.control_effectiveness = 150.0;
        }
        assert!(service.calculate(input).is_ok());
    }

    #[test]
    fn test_ranges_enforced_when_configured() {
        let service = RiskCalculationService::new(CalculationConfig {
            enforce_input_ranges: true,
        });

        let mut input = qualitative_input();
        if let Some(data) = input.qualitative_data.as_mut() {
            data.vulnerability_severity = 11.0;
        }
        let err = service.calculate(input).unwrap_err();
        assert!(err.client_message().contains("vulnerabilitySeverity"));

        let mut input = quantitative_input();
        if let Some(data) = input.quantitative_data.as_mut() {
            data.exposure_factor = 1.5;
        }
        let err = service.calculate(input).unwrap_err();
        assert!(err.client_message().contains("exposureFactor"));

        assert!(service.calculate(qualitative_input()).is_ok());
        assert!(service.calculate(quantitative_input()).is_ok());
    }

    #[test]
    fn test_batch_keeps_order_and_isolates_failures() {
        let service = RiskCalculationService::default();
        let mut bad = qualitative_input();
        bad.method = None;
        let results =
            service.calculate_batch(vec![qualitative_input(), bad, quantitative_input()]);
        assert_eq!(results.len(), 3);
        assert!(results[0].as_ref().unwrap().qualitative_result.is_some());
        assert!(results[1].is_err());
        assert!(results[2].as_ref().unwrap().quantitative_result.is_some());
    }

    #[test]
    fn test_result_json_roundtrip() {
        let service = RiskCalculationService::default();
        let result = service.calculate(qualitative_input()).unwrap();

        let json = serde_json::to_string(&result).unwrap();
        let restored: RiskCalculationResult = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.qualitative_result, result.qualitative_result);
        assert_eq!(restored.recommended_actions, result.recommended_actions);
        assert_eq!(restored.calculated_at, result.calculated_at);
        assert_eq!(restored, result);
    }

    #[test]
    fn test_input_accepts_wire_format() {
        let input: RiskCalculationInput = serde_json::from_value(serde_json::json!({
            "name": "Phishing",
            "description": "",
            "assetName": "Correo",
            "threatDescription": "",
            "vulnerabilityDescription": "",
            "method": "quantitative",
            "quantitativeData": {
                "assetValue": 1000,
                "exposureFactor": 0.2,
                "annualRateOfOccurrence": 3,
                "controlEffectiveness": 30,
                "detectionCapability": 2,
                "responseCapability": 2
            },
            "impactAssessment": {"confidentiality": 2, "integrity": 2, "availability": 1},
            "existingControls": [],
            "proposedControls": ["MFA"]
        }))
        .unwrap();
        assert_eq!(input.method, Some(CalculationMethod::Quantitative));
        assert_eq!(input.proposed_controls, vec!["MFA".to_string()]);
        assert!(input.qualitative_data.is_none());
    }
}

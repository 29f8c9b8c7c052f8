//! Recommendation generation from calculation results.
//!
//! Recommendations are appended in a fixed priority order: method-specific
//! guidance first, then the general closing pair that every result gets.

use crate::level::RiskLevel;
use crate::types::{CalculationMethod, QualitativeResult, QuantitativeResult};

/// Below this percentage reduction the current controls are flagged as weak.
const LIMITED_REDUCTION_THRESHOLD: f64 = 50.0;
/// ROSI percentage above which the investment is called excellent.
const EXCELLENT_ROSI_THRESHOLD: f64 = 100.0;
/// Annual cost avoidance above which implementation is prioritized.
const HIGH_SAVINGS_THRESHOLD: f64 = 100_000.0;

const CRITICAL_ACTIONS: [&str; 3] = [
    "Implementar controles inmediatos - Riesgo crítico requiere acción urgente",
    "Escalar a la alta dirección para aprobación de recursos adicionales",
    "Considerar transferir el riesgo a través de seguros o terceros",
];

const HIGH_ACTIONS: [&str; 3] = [
    "Planificar implementación de controles adicionales en el corto plazo",
    "Aumentar la frecuencia de monitoreo y revisión",
    "Desarrollar un plan de respuesta a incidentes específico",
];

const MEDIUM_ACTIONS: [&str; 3] = [
    "Evaluar costo-beneficio de controles adicionales",
    "Mantener monitoreo regular del riesgo",
    "Documentar decisiones de aceptación de riesgo",
];

const LIMITED_EFFECTIVENESS_ACTIONS: [&str; 2] = [
    "Los controles actuales muestran efectividad limitada - revisar implementación",
    "Considerar controles alternativos o complementarios",
];

const EXCELLENT_ROSI: &str = "Excelente ROI en controles de seguridad - continuar inversión";
const POSITIVE_ROSI: &str = "ROI positivo - los controles son económicamente justificables";
const NEGATIVE_ROSI: &str = "ROI negativo - evaluar controles más costo-efectivos";
const HIGH_SAVINGS: &str = "Alto potencial de ahorro - priorizar implementación de controles";

const GENERAL_ACTIONS: [&str; 2] = [
    "Programar revisión trimestral del riesgo y efectividad de controles",
    "Mantener documentación actualizada de todos los controles implementados",
];

/// Generate ordered recommendations for a calculation.
///
/// Only the result matching `method` is consulted; a missing result skips the
/// method-specific section. The general closing pair is always present.
pub fn generate_recommendations(
    qualitative: Option<&QualitativeResult>,
    quantitative: Option<&QuantitativeResult>,
    method: CalculationMethod,
) -> Vec<String> {
    let mut recommendations: Vec<&str> = Vec::new();

    match (method, qualitative, quantitative) {
        (CalculationMethod::Qualitative, Some(result), _) => {
            match result.residual_risk_level {
                RiskLevel::Critical => recommendations.extend(CRITICAL_ACTIONS),
                RiskLevel::High => recommendations.extend(HIGH_ACTIONS),
                RiskLevel::Medium => recommendations.extend(MEDIUM_ACTIONS),
                RiskLevel::Low | RiskLevel::VeryLow => {}
            }
            if result.risk_reduction < LIMITED_REDUCTION_THRESHOLD {
                recommendations.extend(LIMITED_EFFECTIVENESS_ACTIONS);
            }
        }
        (CalculationMethod::Quantitative, _, Some(result)) => {
            let rosi = result.return_on_security_investment;
            recommendations.push(if rosi > EXCELLENT_ROSI_THRESHOLD {
                EXCELLENT_ROSI
            } else if rosi > 0.0 {
                POSITIVE_ROSI
            } else {
                NEGATIVE_ROSI
            });
            if result.cost_avoidance > HIGH_SAVINGS_THRESHOLD {
                recommendations.push(HIGH_SAVINGS);
            }
        }
        _ => {}
    }

    recommendations.extend(GENERAL_ACTIONS);
    recommendations.into_iter().map(String::from).collect()
}

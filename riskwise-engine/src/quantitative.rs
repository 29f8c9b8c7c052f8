//! Quantitative risk calculation (loss expectancy, NIST SP 800-30 style).

use crate::effectiveness::{apply_control_effectiveness, enhanced_effectiveness};
use crate::round2;
use crate::types::{QuantitativeInput, QuantitativeResult};

/// Estimated control cost as a fraction of the loss it avoids.
pub const ESTIMATED_CONTROL_COST_RATIO: f64 = 0.1;

/// Calculate loss expectancy before and after controls, and the return on
/// the security investment.
///
/// Inputs are not validated: zero or negative asset values, exposure factors
/// or occurrence rates produce zero or negative figures.
pub fn calculate_quantitative(input: &QuantitativeInput) -> QuantitativeResult {
    let single_loss_expectancy = input.asset_value * input.exposure_factor;
    let inherent_ale = single_loss_expectancy * input.annual_rate_of_occurrence;

    let effectiveness = enhanced_effectiveness(
        input.control_effectiveness,
        input.detection_capability,
        input.response_capability,
    );
    let residual_ale = apply_control_effectiveness(inherent_ale, effectiveness);

    let cost_avoidance = inherent_ale - residual_ale;
    let estimated_control_cost = cost_avoidance * ESTIMATED_CONTROL_COST_RATIO;
    let return_on_security_investment = if estimated_control_cost > 0.0 {
        (cost_avoidance - estimated_control_cost) / estimated_control_cost * 100.0
    } else {
        0.0
    };

    QuantitativeResult {
        single_loss_expectancy: round2(single_loss_expectancy),
        annual_loss_expectancy: round2(inherent_ale),
        inherent_ale: round2(inherent_ale),
        residual_ale: round2(residual_ale),
        cost_avoidance: round2(cost_avoidance),
        return_on_security_investment: round2(return_on_security_investment),
    }
}

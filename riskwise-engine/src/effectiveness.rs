//! Control-effectiveness adjustment shared by both calculation methods.

/// Percentage points added per detection or response capability step above 1.
const CAPABILITY_BONUS_PER_STEP: f64 = 5.0;

/// Reduce `base_score` by `effectiveness` percent.
///
/// `effectiveness` is expected in 0-100 and is not clamped: values above 100
/// produce a negative score and negative values increase it.
pub fn apply_control_effectiveness(base_score: f64, effectiveness: f64) -> f64 {
    base_score * (1.0 - effectiveness / 100.0)
}

/// Blend raw control effectiveness with detection and response capability.
///
/// Each capability level above the minimum adds five points (twenty per
/// capability at the top of the scale). The sum is capped at 100 but has no
/// lower bound.
pub fn enhanced_effectiveness(
    control_effectiveness: f64,
    detection_capability: f64,
    response_capability: f64,
) -> f64 {
    (control_effectiveness
        + (detection_capability - 1.0) * CAPABILITY_BONUS_PER_STEP
        + (response_capability - 1.0) * CAPABILITY_BONUS_PER_STEP)
        .min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_effectiveness_keeps_score() {
        assert_eq!(apply_control_effectiveness(12.0, 0.0), 12.0);
        assert_eq!(apply_control_effectiveness(50_000.0, 0.0), 50_000.0);
    }

    #[test]
    fn test_full_effectiveness_removes_score() {
        assert_eq!(apply_control_effectiveness(12.0, 100.0), 0.0);
        assert_eq!(apply_control_effectiveness(25.0, 100.0), 0.0);
    }

    #[test]
    fn test_partial_effectiveness() {
        assert_eq!(apply_control_effectiveness(20.0, 50.0), 10.0);
    }

    #[test]
    fn test_negative_effectiveness_is_not_clamped() {
        assert_eq!(apply_control_effectiveness(10.0, -50.0), 15.0);
    }

    #[test]
    fn test_enhanced_effectiveness_bonus() {
        assert_eq!(enhanced_effectiveness(50.0, 3.0, 3.0), 70.0);
        assert_eq!(enhanced_effectiveness(50.0, 1.0, 1.0), 50.0);
        assert_eq!(enhanced_effectiveness(0.0, 5.0, 5.0), 40.0);
    }

    #[test]
    fn test_enhanced_effectiveness_capped_at_100() {
        assert_eq!(enhanced_effectiveness(95.0, 5.0, 5.0), 100.0);
        assert_eq!(enhanced_effectiveness(100.0, 2.0, 1.0), 100.0);
    }

    #[test]
    fn test_enhanced_effectiveness_has_no_floor() {
        assert_eq!(enhanced_effectiveness(-10.0, 1.0, 1.0), -10.0);
    }
}

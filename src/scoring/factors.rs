use super::error::ScoringError;

pub const DEFAULT_BASELINE: f64 = 1.0;
pub const DEFAULT_MAX_SHIFT: f64 = 0.5;
pub const DEFAULT_MAX_WEIGHT: f64 = 5.0;

/// Clamp a value to the inclusive range [0, 1].
pub fn clip01(value: f64) -> f64 {
    value.min(1.0).max(0.0)
}

/// Reject non-positive (or NaN) denominators.
pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<f64, ScoringError> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ScoringError::InvalidParameter { name, value })
    }
}

/// Clinical Completeness Score: mean of data completeness and mapping coverage.
pub fn ccs_score(completeness_rate: f64, mapping_coverage: f64) -> f64 {
    clip01((completeness_rate + mapping_coverage) / 2.0)
}

/// ECDS Adoption Variability.
///
/// A ratio equal to `baseline` maps to 0.5. Ratios above the baseline push
/// toward 1.0 and ratios below it toward 0.0, clamped independently.
pub fn eav_score(variance_ratio: f64, baseline: f64) -> Result<f64, ScoringError> {
    let baseline = require_positive("baseline", baseline)?;
    Ok(clip01(0.5 + ((variance_ratio / baseline) - 1.0) / 2.0))
}

/// Cutpoint Pressure Risk. Direction of the shift is irrelevant.
pub fn cpr_score(cutpoint_shift: f64, max_shift: f64) -> Result<f64, ScoringError> {
    let max_shift = require_positive("max_shift", max_shift)?;
    Ok(clip01(cutpoint_shift.abs() / max_shift))
}

/// Weight Multiplier from a Stars measure weight.
pub fn wm_score(measure_weight: f64, max_weight: f64) -> Result<f64, ScoringError> {
    let max_weight = require_positive("max_weight", max_weight)?;
    Ok(clip01(measure_weight / max_weight))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_clip01() {
        assert_eq!(clip01(-3.0), 0.0);
        assert_eq!(clip01(0.4), 0.4);
        assert_eq!(clip01(7.0), 1.0);
    }

    #[test]
    fn test_ccs_average() {
        assert!(approx(ccs_score(0.8, 0.9), 0.85));
        assert!(approx(ccs_score(1.0, 1.0), 1.0));
        assert!(approx(ccs_score(0.0, 0.0), 0.0));
    }

    #[test]
    fn test_ccs_clips_out_of_range() {
        assert_eq!(ccs_score(1.2, 1.0), 1.0);
        assert_eq!(ccs_score(-0.5, 0.0), 0.0);
    }

    #[test]
    fn test_eav_baseline_is_midpoint() {
        for baseline in [0.1, 1.0, 2.5, 40.0] {
            assert!(approx(eav_score(baseline, baseline).unwrap(), 0.5));
        }
    }

    #[test]
    fn test_eav_above_and_below_baseline() {
        assert!(approx(eav_score(1.5, 1.0).unwrap(), 0.75));
        assert!(approx(eav_score(0.5, 1.0).unwrap(), 0.25));
    }

    #[test]
    fn test_eav_clamps_each_side_independently() {
        let baseline = 2.0;
        assert_eq!(eav_score(2.0 * baseline, baseline).unwrap(), 1.0);
        assert_eq!(eav_score(0.0, baseline).unwrap(), 0.0);
        assert_eq!(eav_score(3.0, 1.0).unwrap(), 1.0);
    }

    #[test]
    fn test_eav_invalid_baseline() {
        for baseline in [0.0, -1.0, f64::NAN] {
            match eav_score(1.0, baseline) {
                Err(ScoringError::InvalidParameter { name, .. }) => assert_eq!(name, "baseline"),
                other => panic!("expected InvalidParameter, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_cpr_normalization() {
        assert!(approx(cpr_score(0.25, 0.5).unwrap(), 0.5));
        assert_eq!(cpr_score(0.8, 0.5).unwrap(), 1.0);
        assert_eq!(cpr_score(0.0, DEFAULT_MAX_SHIFT).unwrap(), 0.0);
    }

    #[test]
    fn test_cpr_negative_shift_uses_absolute() {
        assert!(approx(cpr_score(-0.25, 0.5).unwrap(), 0.5));
    }

    #[test]
    fn test_cpr_invalid_max_shift() {
        let err = cpr_score(0.2, 0.0).unwrap_err();
        assert!(err.to_string().contains("max_shift"));
    }

    #[test]
    fn test_wm_normalization() {
        assert!(approx(wm_score(3.0, 5.0).unwrap(), 0.6));
        assert_eq!(wm_score(5.0, DEFAULT_MAX_WEIGHT).unwrap(), 1.0);
        assert_eq!(wm_score(0.0, 5.0).unwrap(), 0.0);
        assert_eq!(wm_score(-2.0, 5.0).unwrap(), 0.0);
    }

    #[test]
    fn test_wm_invalid_max_weight() {
        let err = wm_score(1.0, -5.0).unwrap_err();
        assert!(err.to_string().contains("max_weight"));
    }

    #[test]
    fn test_normalizers_bounded_for_extreme_inputs() {
        let inputs = [-1e9, -1.0, -0.1, 0.0, 0.3, 1.0, 7.5, 1e9];
        for &a in &inputs {
            for &b in &inputs {
                let ccs = ccs_score(a, b);
                assert!((0.0..=1.0).contains(&ccs));
            }
            for s in [
                eav_score(a, DEFAULT_BASELINE).unwrap(),
                cpr_score(a, DEFAULT_MAX_SHIFT).unwrap(),
                wm_score(a, DEFAULT_MAX_WEIGHT).unwrap(),
            ] {
                assert!((0.0..=1.0).contains(&s));
            }
        }
    }
}

use serde::{Deserialize, Serialize};

use super::engine::{Normalization, Weights};

/// Scoring section of the config file.
///
/// Every key is optional; anything left out falls back to the built-in
/// defaults.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   weights:
///     ccs: 0.35
///     eav: 0.25
///     cpr: 0.20
///     wm: 0.20
///   normalization:
///     max_shift: 0.5
///     max_weight: 5.0
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: Option<WeightsConfig>,

    #[serde(default)]
    pub normalization: Option<NormalizationConfig>,
}

/// Combination weights, one per factor. Must sum to 1.0 once defaults are
/// filled in.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WeightsConfig {
    #[serde(default)]
    pub ccs: Option<f64>,
    #[serde(default)]
    pub eav: Option<f64>,
    #[serde(default)]
    pub cpr: Option<f64>,
    #[serde(default)]
    pub wm: Option<f64>,
}

/// Denominators for the CPR and WM normalizers.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NormalizationConfig {
    #[serde(default)]
    pub max_shift: Option<f64>,
    #[serde(default)]
    pub max_weight: Option<f64>,
}

impl ScoringConfig {
    /// Effective weights with defaults filled in. Not validated.
    pub fn effective_weights(&self) -> Weights {
        let defaults = Weights::default();
        match &self.weights {
            Some(w) => Weights {
                ccs: w.ccs.unwrap_or(defaults.ccs),
                eav: w.eav.unwrap_or(defaults.eav),
                cpr: w.cpr.unwrap_or(defaults.cpr),
                wm: w.wm.unwrap_or(defaults.wm),
            },
            None => defaults,
        }
    }

    /// Effective normalization parameters with defaults filled in. Not validated.
    pub fn effective_normalization(&self) -> Normalization {
        let defaults = Normalization::default();
        match &self.normalization {
            Some(n) => Normalization {
                max_shift: n.max_shift.unwrap_or(defaults.max_shift),
                max_weight: n.max_weight.unwrap_or(defaults.max_weight),
            },
            None => defaults,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_scoring_config_uses_defaults() {
        let config: ScoringConfig = serde_saphyr::from_str("{}").unwrap();
        assert!(config.weights.is_none());
        assert!(config.normalization.is_none());
        assert_eq!(config.effective_weights(), Weights::default());
        assert_eq!(config.effective_normalization(), Normalization::default());
    }

    #[test]
    fn test_full_scoring_config_parse() {
        let yaml = r#"
weights:
  ccs: 0.4
  eav: 0.2
  cpr: 0.2
  wm: 0.2
normalization:
  max_shift: 1.0
  max_weight: 3.0
"#;
        let config: ScoringConfig = serde_saphyr::from_str(yaml).unwrap();
        let weights = config.effective_weights();
        assert_eq!(weights.ccs, 0.4);
        assert_eq!(weights.wm, 0.2);
        let norm = config.effective_normalization();
        assert_eq!(norm.max_shift, 1.0);
        assert_eq!(norm.max_weight, 3.0);
    }

    #[test]
    fn test_partial_weights_fill_from_defaults() {
        let yaml = r#"
weights:
  ccs: 0.5
"#;
        let config: ScoringConfig = serde_saphyr::from_str(yaml).unwrap();
        let weights = config.effective_weights();
        assert_eq!(weights.ccs, 0.5);
        assert_eq!(weights.eav, 0.25);
        assert_eq!(weights.cpr, 0.20);
        assert_eq!(weights.wm, 0.20);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let yaml = r#"
weights:
  alpha: 0.5
"#;
        let result: Result<ScoringConfig, _> = serde_saphyr::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_scoring_config_serde_roundtrip() {
        let config = ScoringConfig {
            weights: Some(WeightsConfig {
                ccs: Some(0.4),
                eav: Some(0.2),
                cpr: Some(0.2),
                wm: Some(0.2),
            }),
            normalization: Some(NormalizationConfig {
                max_shift: Some(0.75),
                max_weight: Some(4.0),
            }),
        };
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: ScoringConfig = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }
}

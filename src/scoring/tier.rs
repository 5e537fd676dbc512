use serde::Serialize;
use std::fmt;

use super::factors::clip01;

/// Ordinal risk classification of a Shock Index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,      // [0.00, 0.25)
    Moderate, // [0.25, 0.50)
    High,     // [0.50, 0.75)
    Critical, // [0.75, 1.00]
}

impl RiskTier {
    /// All tiers, lowest first.
    pub const ALL: [RiskTier; 4] = [
        RiskTier::Low,
        RiskTier::Moderate,
        RiskTier::High,
        RiskTier::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Moderate => "moderate",
            RiskTier::High => "high",
            RiskTier::Critical => "critical",
        }
    }

    /// Lower bound of the tier's score interval.
    pub fn lower_bound(&self) -> f64 {
        match self {
            RiskTier::Low => 0.0,
            RiskTier::Moderate => 0.25,
            RiskTier::High => 0.50,
            RiskTier::Critical => 0.75,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a score into a risk tier. Out-of-range input is clamped first,
/// so this never fails.
pub fn classify_risk(score: f64) -> RiskTier {
    let score = clip01(score);
    RiskTier::ALL
        .into_iter()
        .rev()
        .find(|tier| score >= tier.lower_bound())
        .unwrap_or(RiskTier::Low)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low() {
        assert_eq!(classify_risk(0.0), RiskTier::Low);
        assert_eq!(classify_risk(0.24), RiskTier::Low);
        assert_eq!(classify_risk(0.2499), RiskTier::Low);
    }

    #[test]
    fn test_moderate() {
        assert_eq!(classify_risk(0.25), RiskTier::Moderate);
        assert_eq!(classify_risk(0.49), RiskTier::Moderate);
    }

    #[test]
    fn test_high() {
        assert_eq!(classify_risk(0.50), RiskTier::High);
        assert_eq!(classify_risk(0.7499), RiskTier::High);
    }

    #[test]
    fn test_critical() {
        assert_eq!(classify_risk(0.75), RiskTier::Critical);
        assert_eq!(classify_risk(1.0), RiskTier::Critical);
    }

    #[test]
    fn test_clips_out_of_range() {
        assert_eq!(classify_risk(-1.0), RiskTier::Low);
        assert_eq!(classify_risk(-0.5), RiskTier::Low);
        assert_eq!(classify_risk(1.5), RiskTier::Critical);
        assert_eq!(classify_risk(2.0), RiskTier::Critical);
    }

    #[test]
    fn test_tiers_are_ordered() {
        assert!(RiskTier::Low < RiskTier::Moderate);
        assert!(RiskTier::Moderate < RiskTier::High);
        assert!(RiskTier::High < RiskTier::Critical);
    }

    #[test]
    fn test_lower_bound_classifies_to_itself() {
        for tier in RiskTier::ALL {
            assert_eq!(classify_risk(tier.lower_bound()), tier);
        }
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RiskTier::Critical).unwrap(), "\"critical\"");
        assert_eq!(RiskTier::Moderate.to_string(), "moderate");
    }
}

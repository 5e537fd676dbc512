use serde::Serialize;

use super::error::ScoringError;
use super::factors::{clip01, require_positive, DEFAULT_MAX_SHIFT, DEFAULT_MAX_WEIGHT};

/// Tolerance for the weights-sum-to-one check.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Combination weights for the four factors.
///
/// A bare value; only a [`ShockIndexCalculator`] guarantees they are valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Weights {
    pub ccs: f64,
    pub eav: f64,
    pub cpr: f64,
    pub wm: f64,
}

impl Default for Weights {
    /// Favors completeness while still accounting for variance, cutpoint
    /// pressure and measure weight.
    fn default() -> Self {
        Self {
            ccs: 0.35,
            eav: 0.25,
            cpr: 0.20,
            wm: 0.20,
        }
    }
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.ccs + self.eav + self.cpr + self.wm
    }

    fn named(&self) -> [(&'static str, f64); 4] {
        [
            ("ccs", self.ccs),
            ("eav", self.eav),
            ("cpr", self.cpr),
            ("wm", self.wm),
        ]
    }

    /// Every rule this weight set breaks: a negative (or NaN) weight, or a
    /// sum more than [`WEIGHT_SUM_TOLERANCE`] away from 1.0.
    pub fn problems(&self) -> Vec<String> {
        let mut problems: Vec<String> = self
            .named()
            .iter()
            .filter(|(_, w)| !(*w >= 0.0))
            .map(|(name, w)| format!("{} must be non-negative (got {})", name, w))
            .collect();

        let total = self.sum();
        if !((total - 1.0).abs() <= WEIGHT_SUM_TOLERANCE) {
            problems.push(format!("must sum to 1.0 (got {})", total));
        }
        problems
    }

    /// Check non-negativity and the sum-to-one constraint.
    pub fn validate(&self) -> Result<(), ScoringError> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ScoringError::InvalidWeights(problems.join("; ")))
        }
    }
}

/// Denominators for the CPR and WM normalizers in batch scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Normalization {
    pub max_shift: f64,
    pub max_weight: f64,
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            max_shift: DEFAULT_MAX_SHIFT,
            max_weight: DEFAULT_MAX_WEIGHT,
        }
    }
}

impl Normalization {
    /// Replace the parameters given on the command line, keep the rest.
    pub fn with_overrides(self, max_shift: Option<f64>, max_weight: Option<f64>) -> Self {
        Self {
            max_shift: max_shift.unwrap_or(self.max_shift),
            max_weight: max_weight.unwrap_or(self.max_weight),
        }
    }

    /// One `InvalidParameter` per non-positive denominator.
    pub fn problems(&self) -> Vec<ScoringError> {
        [("max_shift", self.max_shift), ("max_weight", self.max_weight)]
            .into_iter()
            .filter_map(|(name, value)| require_positive(name, value).err())
            .collect()
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        match self.problems().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Weighted contribution of one factor to a Shock Index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorContribution {
    pub label: &'static str,
    pub score: f64,  // Clamped factor score
    pub weight: f64, // Combination weight
    pub contribution: f64,
}

/// Combines factor scores into a Shock Index.
///
/// Weights are validated once in [`ShockIndexCalculator::new`] and cannot
/// change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ShockIndexCalculator {
    weights: Weights,
}

impl Default for ShockIndexCalculator {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
        }
    }
}

impl ShockIndexCalculator {
    pub fn new(weights: Weights) -> Result<Self, ScoringError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> Weights {
        self.weights
    }

    /// Weighted Shock Index from four factor scores.
    ///
    /// Inputs are clamped individually and the total is clamped again, so
    /// the result is in [0, 1] for any input.
    pub fn calculate(&self, ccs: f64, eav: f64, cpr: f64, wm: f64) -> f64 {
        let weighted = self
            .breakdown(ccs, eav, cpr, wm)
            .iter()
            .map(|f| f.contribution)
            .sum::<f64>();
        clip01(weighted)
    }

    /// Per-factor contributions in CCS, EAV, CPR, WM order.
    pub fn breakdown(&self, ccs: f64, eav: f64, cpr: f64, wm: f64) -> [FactorContribution; 4] {
        let w = &self.weights;
        let entry = |label, raw: f64, weight: f64| {
            let score = clip01(raw);
            FactorContribution {
                label,
                score,
                weight,
                contribution: weight * score,
            }
        };
        [
            entry("CCS", ccs, w.ccs),
            entry("EAV", eav, w.eav),
            entry("CPR", cpr, w.cpr),
            entry("WM", wm, w.wm),
        ]
    }
}

use serde::Serialize;
use tracing::{debug, warn};

use super::engine::{FactorContribution, Normalization, ShockIndexCalculator};
use super::error::ScoringError;
use super::factors::{ccs_score, cpr_score, eav_score, wm_score, DEFAULT_BASELINE};
use super::tier::{classify_risk, RiskTier};

pub const COMPLETENESS_RATE: &str = "completeness_rate";
pub const MAPPING_COVERAGE: &str = "mapping_coverage";
pub const VARIANCE_RATIO: &str = "variance_ratio";
pub const CUTPOINT_SHIFT: &str = "cutpoint_shift";
pub const MEASURE_WEIGHT: &str = "measure_weight";
pub const SHOCK_INDEX: &str = "shock_index";

/// Numeric inputs every measure record is scored from.
pub const INPUT_COLUMNS: [&str; 5] = [
    COMPLETENESS_RATE,
    MAPPING_COVERAGE,
    VARIANCE_RATIO,
    CUTPOINT_SHIFT,
    MEASURE_WEIGHT,
];

/// Derived columns appended by [`ShockIndexCalculator::score_collection`], in output order.
pub const DERIVED_COLUMNS: [&str; 6] = ["ccs", "eav", "cpr", "wm", SHOCK_INDEX, "risk_tier"];

/// Raw inputs for one quality measure.
///
/// Numeric inputs are optional because a left join may leave them empty.
/// `extra` carries passthrough columns from the source files, in order.
/// Whether a column exists at all is tracked by the [`RecordSet`] holding
/// the record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasureRecord {
    pub measure_id: String,
    pub completeness_rate: Option<f64>,
    pub mapping_coverage: Option<f64>,
    pub variance_ratio: Option<f64>,
    pub cutpoint_shift: Option<f64>,
    pub measure_weight: Option<f64>,
    pub extra: Vec<(String, String)>,
}

impl MeasureRecord {
    /// Names of inputs left empty in this record.
    pub fn empty_fields(&self) -> Vec<&'static str> {
        [
            (COMPLETENESS_RATE, self.completeness_rate),
            (MAPPING_COVERAGE, self.mapping_coverage),
            (VARIANCE_RATIO, self.variance_ratio),
            (CUTPOINT_SHIFT, self.cutpoint_shift),
            (MEASURE_WEIGHT, self.measure_weight),
        ]
        .iter()
        .filter(|(_, v)| v.is_none())
        .map(|(name, _)| *name)
        .collect()
    }
}

/// A measure record with its derived scores attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMeasure {
    pub record: MeasureRecord,
    pub ccs: f64,
    pub eav: f64,
    pub cpr: f64,
    pub wm: f64,
    pub shock_index: f64,
    pub risk_tier: RiskTier,
    pub breakdown: [FactorContribution; 4],
}

/// One row of input to [`aggregate`]. Either value may be empty, e.g. a
/// blank cell in a scored CSV or a measure without a weight.
pub trait AggregateInput {
    fn shock_index(&self) -> Option<f64>;
    fn measure_weight(&self) -> Option<f64>;
}

impl AggregateInput for ScoredMeasure {
    fn shock_index(&self) -> Option<f64> {
        Some(self.shock_index)
    }

    fn measure_weight(&self) -> Option<f64> {
        self.record.measure_weight
    }
}

/// A bare (shock index, weight) pair, as read back from a scored CSV.
/// `None` is an empty cell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShockObservation {
    pub shock_index: Option<f64>,
    pub measure_weight: Option<f64>,
}

impl AggregateInput for ShockObservation {
    fn shock_index(&self) -> Option<f64> {
        self.shock_index
    }

    fn measure_weight(&self) -> Option<f64> {
        self.measure_weight
    }
}

/// Rows together with the column names their source provides.
///
/// A column can be present while single cells in it are empty; only a
/// column missing from the set is a `MissingFields` error.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet<T> {
    pub columns: Vec<String>,
    pub rows: Vec<T>,
}

impl<T> RecordSet<T> {
    pub fn new<I, S>(columns: I, rows: Vec<T>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows,
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Add `name` to the columns unless it is already there.
    pub fn add_column(&mut self, name: &str) {
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
    }

    /// Fail with `MissingFields` naming every `required` column not provided.
    pub fn require(&self, required: &[&str]) -> Result<(), ScoringError> {
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|c| !self.has_column(c))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ScoringError::missing_fields(missing))
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<T: AggregateInput> RecordSet<T> {
    /// [`aggregate`] the rows once both `shock_index` and `measure_weight`
    /// columns are known to exist. Missing columns are reported before an
    /// empty set.
    pub fn aggregate(&self) -> Result<ContractSummary, ScoringError> {
        self.require(&[SHOCK_INDEX, MEASURE_WEIGHT])?;
        aggregate(&self.rows)
    }
}

/// Records built in code carry every input column.
impl From<Vec<MeasureRecord>> for RecordSet<MeasureRecord> {
    fn from(rows: Vec<MeasureRecord>) -> Self {
        Self::new(INPUT_COLUMNS, rows)
    }
}

impl From<Vec<ShockObservation>> for RecordSet<ShockObservation> {
    fn from(rows: Vec<ShockObservation>) -> Self {
        Self::new([SHOCK_INDEX, MEASURE_WEIGHT], rows)
    }
}

/// Contract-level roll-up of a scored collection. Floats are rounded to
/// four decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractSummary {
    pub weighted_shock_index: f64,
    pub mean_shock_index: f64,
    pub max_shock_index: f64,
    pub measure_count: usize,
    pub risk_tier: RiskTier,
}

/// Round to four decimal places for presentation.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

impl ShockIndexCalculator {
    /// Score every record independently, preserving input order.
    ///
    /// Fails with `MissingFields` before scoring anything if the set lacks an
    /// input column, and with `InvalidParameter` if `normalization` has a
    /// non-positive denominator. EAV always uses the default baseline.
    ///
    /// An empty cell scores its factor as 0.0: a measure with no weight gets
    /// WM = 0, and CCS is 0 unless both rates are present.
    pub fn score_collection(
        &self,
        records: impl Into<RecordSet<MeasureRecord>>,
        normalization: &Normalization,
    ) -> Result<Vec<ScoredMeasure>, ScoringError> {
        let records = records.into();
        records.require(&INPUT_COLUMNS)?;
        normalization.validate()?;

        debug!(
            count = records.len(),
            max_shift = normalization.max_shift,
            max_weight = normalization.max_weight,
            "scoring measure collection"
        );

        records
            .rows
            .into_iter()
            .map(|record| self.score_record(record, normalization))
            .collect()
    }

    fn score_record(
        &self,
        record: MeasureRecord,
        normalization: &Normalization,
    ) -> Result<ScoredMeasure, ScoringError> {
        let empty = record.empty_fields();
        if !empty.is_empty() {
            warn!(measure_id = %record.measure_id, fields = ?empty, "empty inputs score as zero");
        }

        let ccs = match (record.completeness_rate, record.mapping_coverage) {
            (Some(cr), Some(mc)) => ccs_score(cr, mc),
            _ => 0.0,
        };
        let eav = match record.variance_ratio {
            Some(vr) => eav_score(vr, DEFAULT_BASELINE)?,
            None => 0.0,
        };
        let cpr = match record.cutpoint_shift {
            Some(shift) => cpr_score(shift, normalization.max_shift)?,
            None => 0.0,
        };
        let wm = match record.measure_weight {
            Some(weight) => wm_score(weight, normalization.max_weight)?,
            None => 0.0,
        };

        let shock_index = self.calculate(ccs, eav, cpr, wm);
        let risk_tier = classify_risk(shock_index);
        debug!(measure_id = %record.measure_id, shock_index, %risk_tier, "scored measure");

        Ok(ScoredMeasure {
            breakdown: self.breakdown(ccs, eav, cpr, wm),
            record,
            ccs,
            eav,
            cpr,
            wm,
            shock_index,
            risk_tier,
        })
    }

    /// Roll a scored collection up into a contract summary.
    ///
    /// The weighted index is 0.0 when all measure weights are zero. An empty
    /// collection fails with `EmptyInput`.
    ///
    /// A row without a measure weight counts toward the mean, max and count
    /// but is left out of the weighted index and its total weight. A row
    /// without a shock index is skipped entirely.
    pub fn aggregate<T: AggregateInput>(&self, scored: &[T]) -> Result<ContractSummary, ScoringError> {
        aggregate(scored)
    }
}

/// See [`ShockIndexCalculator::aggregate`]; the roll-up does not depend on
/// the calculator's weights.
pub fn aggregate<T: AggregateInput>(scored: &[T]) -> Result<ContractSummary, ScoringError> {
    let rows: Vec<(f64, Option<f64>)> = scored
        .iter()
        .filter_map(|s| Some((s.shock_index()?, s.measure_weight())))
        .collect();
    if rows.is_empty() {
        return Err(ScoringError::EmptyInput);
    }

    let total_weight: f64 = rows.iter().filter_map(|(_, w)| *w).sum();
    let weighted = if total_weight == 0.0 {
        0.0
    } else {
        rows.iter()
            .filter_map(|(si, w)| w.map(|w| si * w))
            .sum::<f64>()
            / total_weight
    };
    let mean = rows.iter().map(|(si, _)| si).sum::<f64>() / rows.len() as f64;
    let max = rows
        .iter()
        .map(|(si, _)| *si)
        .fold(f64::NEG_INFINITY, f64::max);

    debug!(
        measure_count = rows.len(),
        skipped = scored.len() - rows.len(),
        total_weight,
        weighted,
        "aggregated contract summary"
    );

    Ok(ContractSummary {
        weighted_shock_index: round4(weighted),
        mean_shock_index: round4(mean),
        max_shock_index: round4(max),
        measure_count: rows.len(),
        risk_tier: classify_risk(weighted),
    })
}

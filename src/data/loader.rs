use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};

use crate::scoring::batch::{
    COMPLETENESS_RATE, CUTPOINT_SHIFT, MAPPING_COVERAGE, MEASURE_WEIGHT, SHOCK_INDEX,
    VARIANCE_RATIO,
};
use crate::scoring::{MeasureRecord, RecordSet, ShockObservation};

pub const MEASURE_ID: &str = "measure_id";

/// Columns the NCQA ECDS results file must provide.
pub const RESULTS_COLUMNS: [&str; 5] = [
    MEASURE_ID,
    COMPLETENESS_RATE,
    MAPPING_COVERAGE,
    VARIANCE_RATIO,
    CUTPOINT_SHIFT,
];

/// Columns the CMS Stars measure weights file must provide.
pub const WEIGHTS_COLUMNS: [&str; 2] = [MEASURE_ID, MEASURE_WEIGHT];

/// One row of the measure weights file.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightRow {
    pub measure_id: String,
    pub measure_weight: Option<f64>,
    pub extra: Vec<(String, String)>,
}

/// A parsed CSV file with a header index.
struct Table {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<StringRecord>,
}

impl Table {
    fn read(path: &Path) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .from_path(path)
            .with_context(|| format!("Failed to open CSV file at {}", path.display()))?;

        let headers: Vec<String> = reader
            .headers()
            .with_context(|| format!("Failed to read CSV header in {}", path.display()))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut index = HashMap::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            if index.insert(header.clone(), i).is_some() {
                bail!("{}: duplicate column '{}'", path.display(), header);
            }
        }

        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to parse CSV rows in {}", path.display()))?;

        Ok(Self { headers, index, rows })
    }

    /// Fail if any of `required` is not a header. Names are reported sorted.
    fn require(&self, required: &[&str], path: &Path) -> Result<()> {
        let mut missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|c| !self.index.contains_key(*c))
            .collect();
        if !missing.is_empty() {
            missing.sort_unstable();
            bail!(
                "{}: missing required columns: {}",
                path.display(),
                missing.join(", ")
            );
        }
        Ok(())
    }

    fn text<'a>(&self, row: &'a StringRecord, column: &str) -> Option<&'a str> {
        self.index.get(column).and_then(|&i| row.get(i))
    }

    /// Numeric cell. Empty cells and NaN read as absent.
    fn number(&self, row: &StringRecord, line: usize, column: &str) -> Result<Option<f64>> {
        match self.text(row, column) {
            None => Ok(None),
            Some(cell) => parse_cell(cell)
                .with_context(|| format!("row {}, column '{}'", line, column)),
        }
    }

    /// Columns other than `known`, in header order.
    fn extra(&self, row: &StringRecord, known: &[&str]) -> Vec<(String, String)> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !known.contains(&h.as_str()))
            .map(|(i, h)| (h.clone(), row.get(i).unwrap_or("").to_string()))
            .collect()
    }
}

fn parse_cell(cell: &str) -> Result<Option<f64>> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let value: f64 = cell
        .parse()
        .with_context(|| format!("invalid number '{}'", cell))?;
    Ok(Some(value))
}

/// Load the NCQA ECDS results CSV.
///
/// Expected columns: measure_id, completeness_rate, mapping_coverage,
/// variance_ratio, cutpoint_shift. Any other columns are carried along.
/// The set has no `measure_weight` column until merged with the weights.
pub fn load_ncqa_ecds(path: &Path) -> Result<RecordSet<MeasureRecord>> {
    let table = Table::read(path)?;
    table.require(&RESULTS_COLUMNS, path)?;

    let records = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| -> Result<MeasureRecord> {
            let line = i + 2; // 1-based, after the header
            Ok(MeasureRecord {
                measure_id: table.text(row, MEASURE_ID).unwrap_or("").to_string(),
                completeness_rate: table.number(row, line, COMPLETENESS_RATE)?,
                mapping_coverage: table.number(row, line, MAPPING_COVERAGE)?,
                variance_ratio: table.number(row, line, VARIANCE_RATIO)?,
                cutpoint_shift: table.number(row, line, CUTPOINT_SHIFT)?,
                measure_weight: None,
                extra: table.extra(row, &RESULTS_COLUMNS),
            })
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Failed to load ECDS results from {}", path.display()))?;

    debug!(path = %path.display(), rows = records.len(), "loaded ECDS results");
    Ok(RecordSet::new(RESULTS_COLUMNS, records))
}

/// Load the CMS Stars measure weights CSV.
pub fn load_cms_measure_weights(path: &Path) -> Result<Vec<WeightRow>> {
    let table = Table::read(path)?;
    table.require(&WEIGHTS_COLUMNS, path)?;

    let rows = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| -> Result<WeightRow> {
            Ok(WeightRow {
                measure_id: table.text(row, MEASURE_ID).unwrap_or("").to_string(),
                measure_weight: table.number(row, i + 2, MEASURE_WEIGHT)?,
                extra: table.extra(row, &WEIGHTS_COLUMNS),
            })
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Failed to load measure weights from {}", path.display()))?;

    debug!(path = %path.display(), rows = rows.len(), "loaded measure weights");
    Ok(rows)
}

/// Left outer join of results and weights on `measure_id`.
///
/// Results without a weight row keep `measure_weight` empty. A result that
/// matches several weight rows yields one record per match, in weights-file
/// order. Passthrough columns present in both sources get `_x` (results) and
/// `_y` (weights) suffixes, as do passthrough columns named like a required
/// column of the other file.
pub fn merge_ecds_and_weights(
    results: RecordSet<MeasureRecord>,
    weights: &[WeightRow],
) -> RecordSet<MeasureRecord> {
    let mut by_id: HashMap<&str, Vec<&WeightRow>> = HashMap::new();
    for row in weights {
        by_id.entry(row.measure_id.as_str()).or_default().push(row);
    }

    let left_names: HashSet<&str> = results
        .rows
        .iter()
        .flat_map(|r| r.extra.iter().map(|(k, _)| k.as_str()))
        .collect();
    let right_names: HashSet<&str> = weights
        .iter()
        .flat_map(|w| w.extra.iter().map(|(k, _)| k.as_str()))
        .collect();
    let shared: HashSet<&str> = left_names.intersection(&right_names).copied().collect();

    let left_clashes: HashSet<String> = left_names
        .iter()
        .filter(|k| shared.contains(*k) || WEIGHTS_COLUMNS.contains(*k))
        .map(|k| k.to_string())
        .collect();
    let right_clashes: HashSet<String> = right_names
        .iter()
        .filter(|k| shared.contains(*k) || RESULTS_COLUMNS.contains(*k))
        .map(|k| k.to_string())
        .collect();

    let suffixed = |extra: &[(String, String)], clashes: &HashSet<String>, suffix: &str| {
        extra
            .iter()
            .map(|(k, v)| {
                if clashes.contains(k) {
                    (format!("{}{}", k, suffix), v.clone())
                } else {
                    (k.clone(), v.clone())
                }
            })
            .collect::<Vec<_>>()
    };

    let RecordSet { columns, rows } = results;
    let mut merged = RecordSet::new(columns, Vec::with_capacity(rows.len()));
    merged.add_column(MEASURE_WEIGHT);

    for mut record in rows {
        record.extra = suffixed(&record.extra, &left_clashes, "_x");
        match by_id.get(record.measure_id.as_str()) {
            Some(matches) => {
                for weight in matches {
                    let mut joined = record.clone();
                    joined.measure_weight = weight.measure_weight;
                    joined
                        .extra
                        .extend(suffixed(&weight.extra, &right_clashes, "_y"));
                    merged.rows.push(joined);
                }
            }
            None => {
                warn!(measure_id = %record.measure_id, "no measure weight found for measure");
                merged.rows.push(record);
            }
        }
    }
    merged
}

/// Load `shock_index` / `measure_weight` pairs from a previously scored CSV.
///
/// Missing columns are not an error here; the returned set records the
/// file's header so aggregation can name them.
pub fn load_scored_observations(path: &Path) -> Result<RecordSet<ShockObservation>> {
    let table = Table::read(path)?;

    let observations = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| -> Result<ShockObservation> {
            Ok(ShockObservation {
                shock_index: table.number(row, i + 2, SHOCK_INDEX)?,
                measure_weight: table.number(row, i + 2, MEASURE_WEIGHT)?,
            })
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Failed to load scored measures from {}", path.display()))?;

    debug!(path = %path.display(), rows = observations.len(), "loaded scored measures");
    Ok(RecordSet::new(table.headers, observations))
}

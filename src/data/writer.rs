use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::io::Write;
use std::path::Path;

use super::loader::RESULTS_COLUMNS;
use crate::scoring::batch::MEASURE_WEIGHT;
use crate::scoring::{ScoredMeasure, DERIVED_COLUMNS};

/// Passthrough column names across all records, in first-seen order.
fn extra_columns(scored: &[ScoredMeasure]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for s in scored {
        for (name, _) in &s.record.extra {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
    }
    columns
}

fn number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Header name for each passthrough column. A name the writer already uses
/// for a standard or derived column gets `_x` appended until it is unique.
fn passthrough_headers(extras: &[String]) -> Vec<String> {
    let reserved: Vec<&str> = RESULTS_COLUMNS
        .iter()
        .chain([MEASURE_WEIGHT].iter())
        .chain(DERIVED_COLUMNS.iter())
        .copied()
        .collect();
    let mut taken: Vec<String> = reserved
        .iter()
        .map(|c| c.to_string())
        .chain(extras.iter().cloned())
        .collect();

    extras
        .iter()
        .map(|name| {
            if !reserved.contains(&name.as_str()) {
                return name.clone();
            }
            let mut header = format!("{}_x", name);
            while taken.contains(&header) {
                header.push_str("_x");
            }
            taken.push(header.clone());
            header
        })
        .collect()
}

/// Write a scored collection as CSV.
///
/// Columns: the required result columns, `measure_weight`, passthrough
/// columns, then the derived scores. Records lacking a passthrough column get
/// an empty cell.
pub fn write_scored<W: Write>(writer: W, scored: &[ScoredMeasure]) -> Result<()> {
    let extras = extra_columns(scored);
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header: Vec<String> = RESULTS_COLUMNS.iter().map(|c| c.to_string()).collect();
    header.push(MEASURE_WEIGHT.to_string());
    header.extend(passthrough_headers(&extras));
    header.extend(DERIVED_COLUMNS.iter().map(|c| c.to_string()));
    wtr.write_record(&header).context("Failed to write CSV header")?;

    for s in scored {
        let r = &s.record;
        let mut row = vec![
            r.measure_id.clone(),
            number(r.completeness_rate),
            number(r.mapping_coverage),
            number(r.variance_ratio),
            number(r.cutpoint_shift),
            number(r.measure_weight),
        ];
        for column in &extras {
            let cell = r
                .extra
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, value)| value.clone())
                .unwrap_or_default();
            row.push(cell);
        }
        row.extend([
            s.ccs.to_string(),
            s.eav.to_string(),
            s.cpr.to_string(),
            s.wm.to_string(),
            s.shock_index.to_string(),
            s.risk_tier.to_string(),
        ]);
        wtr.write_record(&row)
            .with_context(|| format!("Failed to write CSV row for measure {}", r.measure_id))?;
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// Save a scored collection to `path` atomically.
///
/// The file is only replaced once every row has been written.
pub fn save_scored_csv(path: &Path, scored: &[ScoredMeasure]) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    write_scored(&mut file, scored)?;

    file.commit()
        .with_context(|| format!("Failed to save scored CSV to {}", path.display()))?;
    Ok(())
}

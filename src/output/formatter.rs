use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde_json::json;
use std::io::IsTerminal;
use std::path::Path;

use crate::scoring::{
    round4, ContractSummary, FactorContribution, Normalization, RiskTier, ScoredMeasure, Weights,
};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Render a tier name, padded to `width`, colored by severity.
fn paint_tier(tier: RiskTier, width: usize, use_colors: bool) -> String {
    let text = format!("{:<width$}", tier.as_str(), width = width);
    if !use_colors {
        return text;
    }
    match tier {
        RiskTier::Low => text.green().to_string(),
        RiskTier::Moderate => text.yellow().to_string(),
        RiskTier::High => text.red().to_string(),
        RiskTier::Critical => text.red().bold().to_string(),
    }
}

pub fn format_tier(tier: RiskTier, use_colors: bool) -> String {
    paint_tier(tier, 0, use_colors)
}

/// One-line result for single mode.
/// Format: "ECDS Shock Index: 0.6200  (high risk)"
pub fn format_single(score: f64, tier: RiskTier, use_colors: bool) -> String {
    let value = format!("{:.4}", score);
    let value = if use_colors {
        value.bold().to_string()
    } else {
        value
    };
    format!(
        "ECDS Shock Index: {}  ({} risk)",
        value,
        format_tier(tier, use_colors)
    )
}

/// Compact JSON object with `shock_index` and `risk_tier` keys.
pub fn format_single_json(score: f64, tier: RiskTier) -> Result<String> {
    serde_json::to_string(&json!({
        "shock_index": round4(score),
        "risk_tier": tier,
    }))
    .context("Failed to serialize result")
}

/// Format scored measures as a table, one row per measure, in input order.
/// Columns: ID, CCS, EAV, CPR, WM, Shock Index, Tier
pub fn format_scored_table(scored: &[ScoredMeasure], use_colors: bool) -> String {
    if scored.is_empty() {
        return "No measures found.".to_string();
    }

    let id_width = scored
        .iter()
        .map(|s| s.record.measure_id.chars().count())
        .max()
        .unwrap_or(0)
        .max("measure_id".len());

    let header = format!(
        "{:<id_width$}  {:>6}  {:>6}  {:>6}  {:>6}  {:>11}  {}",
        "measure_id",
        "ccs",
        "eav",
        "cpr",
        "wm",
        "shock_index",
        "risk_tier",
        id_width = id_width
    );
    let header = if use_colors {
        header.dimmed().to_string()
    } else {
        header
    };

    let rows = scored.iter().map(|s| {
        format!(
            "{:<id_width$}  {:>6.4}  {:>6.4}  {:>6.4}  {:>6.4}  {:>11.4}  {}",
            s.record.measure_id,
            s.ccs,
            s.eav,
            s.cpr,
            s.wm,
            s.shock_index,
            paint_tier(s.risk_tier, 0, use_colors),
            id_width = id_width
        )
    });

    std::iter::once(header)
        .chain(rows)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Per-factor contribution lines for verbose mode.
/// Format: "  CCS  0.8950 x 0.35 = 0.3133"
pub fn format_breakdown(parts: &[FactorContribution]) -> String {
    parts
        .iter()
        .map(|f| {
            format!(
                "  {:<4} {:.4} x {:.2} = {:.4}",
                f.label, f.score, f.weight, f.contribution
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Multi-line human-readable contract summary.
pub fn format_contract_summary(summary: &ContractSummary, use_colors: bool) -> String {
    let title = if use_colors {
        "Contract Summary".bold().to_string()
    } else {
        "Contract Summary".to_string()
    };
    format!(
        "{}\n  Weighted Shock Index: {:.4}\n  Mean Shock Index:     {:.4}\n  Max Shock Index:      {:.4}\n  Measure Count:        {}\n  Risk Tier:            {}",
        title,
        summary.weighted_shock_index,
        summary.mean_shock_index,
        summary.max_shock_index,
        summary.measure_count,
        format_tier(summary.risk_tier, use_colors)
    )
}

/// Pretty-printed JSON contract summary.
pub fn format_summary_json(summary: &ContractSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("Failed to serialize contract summary")
}

/// Contract summary as text or pretty JSON.
pub fn format_summary(summary: &ContractSummary, json: bool, use_colors: bool) -> Result<String> {
    if json {
        format_summary_json(summary)
    } else {
        Ok(format_contract_summary(summary, use_colors))
    }
}

/// Everything `batch` prints to stdout: the scored table (or where the
/// scored CSV went), a blank line, then the contract summary.
pub fn format_batch_report(
    scored: &[ScoredMeasure],
    written_to: Option<&Path>,
    summary: &ContractSummary,
    json: bool,
    use_colors: bool,
) -> Result<String> {
    let body = match written_to {
        Some(path) => format!("Scored CSV written to {}", path.display()),
        None => format_scored_table(scored, use_colors),
    };
    Ok(format!("{}\n\n{}", body, format_summary(summary, json, use_colors)?))
}

/// Effective weights and normalization parameters.
pub fn format_weights(weights: &Weights, normalization: &Normalization) -> String {
    format!(
        "Weights\n  CCS: {:.4}\n  EAV: {:.4}\n  CPR: {:.4}\n  WM:  {:.4}\nNormalization\n  max_shift:  {}\n  max_weight: {}",
        weights.ccs,
        weights.eav,
        weights.cpr,
        weights.wm,
        normalization.max_shift,
        normalization.max_weight
    )
}

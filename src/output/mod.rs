pub mod formatter;

pub use formatter::{
    format_batch_report, format_breakdown, format_contract_summary, format_scored_table,
    format_single, format_single_json, format_summary, format_summary_json, format_tier,
    format_weights, should_use_colors,
};

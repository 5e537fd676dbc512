pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod factors;
pub mod tier;
pub mod validation;

pub use batch::{
    aggregate, round4, AggregateInput, ContractSummary, MeasureRecord, RecordSet, ScoredMeasure,
    ShockObservation, DERIVED_COLUMNS, INPUT_COLUMNS,
};
pub use config::*;
pub use engine::{FactorContribution, Normalization, ShockIndexCalculator, Weights};
pub use error::ScoringError;
pub use factors::{ccs_score, clip01, cpr_score, eav_score, wm_score};
pub use tier::{classify_risk, RiskTier};
pub use validation::validate_scoring;

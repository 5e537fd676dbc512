pub mod loader;
pub mod writer;

pub use loader::{
    load_cms_measure_weights, load_ncqa_ecds, load_scored_observations, merge_ecds_and_weights,
    WeightRow, RESULTS_COLUMNS, WEIGHTS_COLUMNS,
};
pub use writer::{save_scored_csv, write_scored};

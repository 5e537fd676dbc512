use thiserror::Error;

/// Errors raised by the scoring engine.
///
/// Every variant is a caller mistake; nothing here is retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    /// A normalizer denominator (`baseline`, `max_shift`, `max_weight`) was not positive.
    #[error("{name} must be greater than zero (got {value})")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("invalid weights: {0}")]
    InvalidWeights(String),

    /// Field names are sorted and deduplicated.
    #[error("missing required columns: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("cannot aggregate an empty collection of measures")]
    EmptyInput,
}

impl ScoringError {
    /// Build a `MissingFields` error with sorted, unique names.
    pub fn missing_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        fields.sort();
        fields.dedup();
        ScoringError::MissingFields(fields)
    }
}

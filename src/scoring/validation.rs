use super::config::ScoringConfig;

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = config
        .effective_weights()
        .problems()
        .into_iter()
        .map(|problem| format!("scoring.weights: {}", problem))
        .collect();

    errors.extend(
        config
            .effective_normalization()
            .problems()
            .into_iter()
            .map(|problem| format!("scoring.normalization: {}", problem)),
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

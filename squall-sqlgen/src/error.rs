use thiserror::Error;

/// Sampler configuration errors, detected at construction time.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("`{name}` must be a probability in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },

    #[error("join types must not be empty")]
    EmptyJoinTypes,

    #[error("cross join cannot be sampled (it carries no join predicate)")]
    CrossJoinNotSupported,

    #[error("join type weights must match the number of join types")]
    WeightsLengthMismatch,

    #[error("join type weights must sum to one")]
    WeightsSumMismatch,

    #[error("`max_num_aggregates` must be at least one")]
    ZeroAggregates,
}

pub(crate) fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { name, value })
    }
}

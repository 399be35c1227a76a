//! Forecast pipeline errors.

use thiserror::Error;

/// Errors raised by the estimator, simulator and report builder.
///
/// Construction of a projection is all-or-nothing: the first error aborts the
/// whole report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// A record that cannot be bucketed (e.g. missing timestamp).
    #[error("invalid record at index {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    /// Too few distinct observed weeks to estimate a rate.
    #[error(
        "insufficient history: {distinct_weeks} distinct week(s) observed, {required} required"
    )]
    InsufficientHistory {
        distinct_weeks: usize,
        required: usize,
    },

    /// A negative or non-finite rate reached the simulator.
    #[error("invalid rate {rate} for group {group}")]
    InvalidRate { group: String, rate: f64 },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The draw budget or the trial-matrix cap would be exceeded.
    #[error("simulation needs {requested} draws, budget is {budget}")]
    WorkBudgetExceeded { requested: u128, budget: u64 },
}

pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<ForecastError> for bf_common::Error {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::InvalidRecord { index, reason } => {
                bf_common::Error::InvalidRecord { index, reason }
            }
            ForecastError::InsufficientHistory {
                distinct_weeks,
                required,
            } => bf_common::Error::InsufficientHistory {
                distinct_weeks,
                required,
            },
            ForecastError::InvalidRate { group, rate } => {
                bf_common::Error::InvalidRate { group, rate }
            }
            ForecastError::InvalidParameter(msg) => bf_common::Error::InvalidParameter(msg),
            ForecastError::WorkBudgetExceeded { requested, budget } => {
                bf_common::Error::WorkBudgetExceeded { requested, budget }
            }
        }
    }
}

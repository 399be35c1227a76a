//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::forecast::ForecastConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Upper bound on trials accepted from configuration.
pub const MAX_NUM_SIMULATIONS: usize = 1_000_000;

/// Upper bound on the forecast horizon (ten years of weeks).
pub const MAX_NUM_WEEKS_FUTURE: usize = 520;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

/// Validate a forecast configuration semantically.
pub fn validate_config(config: &ForecastConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    let sim = &config.simulation;
    check_range(
        "simulation.num_simulations",
        sim.num_simulations,
        1,
        MAX_NUM_SIMULATIONS,
    )?;
    check_range(
        "simulation.num_weeks_future",
        sim.num_weeks_future,
        1,
        MAX_NUM_WEEKS_FUTURE,
    )?;
    if sim.max_draws == 0 {
        return Err(ValidationError::InvalidValue {
            field: "simulation.max_draws".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }

    // A single week carries no rate signal.
    if config.estimation.min_distinct_weeks < 2 {
        return Err(ValidationError::InvalidValue {
            field: "estimation.min_distinct_weeks".to_string(),
            message: format!(
                "Must be at least 2, got {}",
                config.estimation.min_distinct_weeks
            ),
        });
    }

    Ok(())
}

fn check_range(field: &str, value: usize, min: usize, max: usize) -> ValidationResult<()> {
    if value < min || value > max {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("Must be in [{min}, {max}], got {value}"),
        });
    }
    Ok(())
}

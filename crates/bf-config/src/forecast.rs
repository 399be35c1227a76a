//! Forecast configuration types.
//!
//! Every section has serde defaults, so a file only needs the fields it
//! changes plus `schema_version`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::validate::ValidationError;

/// Default trial count (the interactive slider's initial value).
pub const DEFAULT_NUM_SIMULATIONS: usize = 1000;

/// Default forecast horizon in weeks.
pub const DEFAULT_NUM_WEEKS_FUTURE: usize = 12;

/// Default cap on `trials × weeks × groups` Poisson draws per series.
///
/// At one group this bounds the trial matrix to about 400 MB.
pub const DEFAULT_MAX_DRAWS: u64 = 50_000_000;

/// Minimum distinct observed weeks before a rate is considered meaningful.
pub const DEFAULT_MIN_DISTINCT_WEEKS: usize = 2;

/// Complete forecast configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ForecastConfig {
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub simulation: SimulationSettings,

    #[serde(default)]
    pub estimation: EstimationSettings,

    #[serde(default)]
    pub output: OutputSettings,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            description: None,
            simulation: SimulationSettings::default(),
            estimation: EstimationSettings::default(),
            output: OutputSettings::default(),
        }
    }
}

impl ForecastConfig {
    /// Load a config from a JSON file (shape only; see [`crate::validate_config`]).
    pub fn from_file(path: &std::path::Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_json(&content)
    }

    /// Parse a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }
}

/// Monte Carlo parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SimulationSettings {
    /// Number of independent trials.
    pub num_simulations: usize,

    /// Forecast horizon in weeks.
    pub num_weeks_future: usize,

    /// Fixed seed for reproducible runs. `None` draws one from OS entropy.
    pub seed: Option<u64>,

    /// Upper bound on Poisson draws per series (`trials × weeks × groups`).
    pub max_draws: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            num_simulations: DEFAULT_NUM_SIMULATIONS,
            num_weeks_future: DEFAULT_NUM_WEEKS_FUTURE,
            seed: None,
            max_draws: DEFAULT_MAX_DRAWS,
        }
    }
}

/// Rate estimation policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EstimationSettings {
    pub group_by: GroupBy,

    /// Records must span at least this many distinct calendar weeks.
    pub min_distinct_weeks: usize,
}

impl Default for EstimationSettings {
    fn default() -> Self {
        Self {
            group_by: GroupBy::Ungrouped,
            min_distinct_weeks: DEFAULT_MIN_DISTINCT_WEEKS,
        }
    }
}

/// Display policy for the estimated totals.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutputSettings {
    pub total_rounding: TotalRounding,
}

/// How records are partitioned into independent Poisson processes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    JsonSchema,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// One rate for the whole record set.
    #[default]
    Ungrouped,
    /// One rate per `group_key` (e.g. per project); draws are summed.
    GroupKey,
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupBy::Ungrouped => write!(f, "ungrouped"),
            GroupBy::GroupKey => write!(f, "group_key"),
        }
    }
}

/// Conversion of a fractional estimated total to an integer display value.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    JsonSchema,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum TotalRounding {
    /// Drop the fractional part.
    #[default]
    Truncate,
    /// Round half away from zero.
    Nearest,
}

impl TotalRounding {
    pub fn apply(self, value: f64) -> i64 {
        match self {
            TotalRounding::Truncate => value.trunc() as i64,
            TotalRounding::Nearest => value.round() as i64,
        }
    }
}

impl fmt::Display for TotalRounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TotalRounding::Truncate => write!(f, "truncate"),
            TotalRounding::Nearest => write!(f, "nearest"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_takes_defaults() {
        let config = ForecastConfig::from_json(r#"{"schema_version":"1.0.0"}"#).unwrap();
        assert_eq!(config, ForecastConfig::default());
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let config = ForecastConfig::from_json(
            r#"{
                "schema_version": "1.0.0",
                "simulation": { "num_simulations": 5000, "seed": 7 },
                "estimation": { "group_by": "group_key" },
                "output": { "total_rounding": "nearest" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.simulation.num_simulations, 5000);
        assert_eq!(config.simulation.num_weeks_future, DEFAULT_NUM_WEEKS_FUTURE);
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.estimation.group_by, GroupBy::GroupKey);
        assert_eq!(config.estimation.min_distinct_weeks, 2);
        assert_eq!(config.output.total_rounding, TotalRounding::Nearest);
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = ForecastConfig::from_json("{").unwrap_err();
        assert!(matches!(err, ValidationError::ParseError(_)));
    }

    #[test]
    fn rounding_policies() {
        assert_eq!(TotalRounding::Truncate.apply(41.9), 41);
        assert_eq!(TotalRounding::Nearest.apply(41.9), 42);
        assert_eq!(TotalRounding::Nearest.apply(41.5), 42);
        assert_eq!(TotalRounding::Truncate.apply(0.0), 0);
    }
}

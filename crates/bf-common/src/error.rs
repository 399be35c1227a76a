//! Error types for Backlog Forecast.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Not Enough History
//!   Reason: insufficient history: 1 distinct week(s) observed, 2 required
//!   Fix: Widen the author selection or supply records covering at least two calendar weeks.
//! ```
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 21,
//!   "category": "estimation",
//!   "message": "insufficient history: 1 distinct week(s) observed, 2 required",
//!   "recoverable": true,
//!   "suggested_action": "widen_selection",
//!   "context": { "distinct_weeks": 1, "required": 2 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for Backlog Forecast operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file errors.
    Config,
    /// Malformed input records.
    Input,
    /// Weekly rate estimation errors.
    Estimation,
    /// Monte Carlo simulation errors.
    Simulation,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Estimation => write!(f, "estimation"),
            ErrorCategory::Simulation => write!(f, "simulation"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Suggested actions for agents to take in response to errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Retry the operation.
    Retry,
    /// Reset configuration to defaults.
    ResetConfig,
    /// Run the config validation command.
    RunCheck,
    /// Fix the offending input rows.
    FixInput,
    /// Select more records (more authors, longer history).
    WidenSelection,
    /// Lower the simulation parameters.
    ReduceWork,
    /// Manual intervention required (likely a bug).
    ManualIntervention,
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestedAction::Retry => write!(f, "retry"),
            SuggestedAction::ResetConfig => write!(f, "reset_config"),
            SuggestedAction::RunCheck => write!(f, "run_check"),
            SuggestedAction::FixInput => write!(f, "fix_input"),
            SuggestedAction::WidenSelection => write!(f, "widen_selection"),
            SuggestedAction::ReduceWork => write!(f, "reduce_work"),
            SuggestedAction::ManualIntervention => write!(f, "manual_intervention"),
        }
    }
}

/// Unified error type for Backlog Forecast.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid forecast config: {0}")]
    InvalidConfig(String),

    // Input errors (20-29)
    #[error("invalid record at index {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("insufficient history: {distinct_weeks} distinct week(s) observed, {required} required")]
    InsufficientHistory {
        distinct_weeks: usize,
        required: usize,
    },

    #[error("could not read records: {0}")]
    Ingest(String),

    // Simulation errors (30-39)
    #[error("invalid rate {rate} for group {group}")]
    InvalidRate { group: String, rate: f64 },

    #[error("invalid simulation parameter: {0}")]
    InvalidParameter(String),

    #[error("simulation needs {requested} draws, budget is {budget}")]
    WorkBudgetExceeded { requested: u128, budget: u64 },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Input and estimation errors
    /// - 30-39: Simulation errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidConfig(_) => 11,
            Error::InvalidRecord { .. } => 20,
            Error::InsufficientHistory { .. } => 21,
            Error::Ingest(_) => 22,
            Error::InvalidRate { .. } => 30,
            Error::InvalidParameter(_) => 31,
            Error::WorkBudgetExceeded { .. } => 32,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidConfig(_) => ErrorCategory::Config,
            Error::InvalidRecord { .. } | Error::Ingest(_) => ErrorCategory::Input,
            Error::InsufficientHistory { .. } => ErrorCategory::Estimation,
            Error::InvalidRate { .. }
            | Error::InvalidParameter(_)
            | Error::WorkBudgetExceeded { .. } => ErrorCategory::Simulation,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable by the user.
    ///
    /// An invalid rate reaching the simulator is a contract violation and is
    /// never recoverable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) | Error::InvalidConfig(_) => true,
            Error::InvalidRecord { .. } | Error::Ingest(_) => true,
            Error::InsufficientHistory { .. } => true,
            Error::InvalidRate { .. } => false,
            Error::InvalidParameter(_) | Error::WorkBudgetExceeded { .. } => true,
            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Returns the suggested action for agents.
    pub fn suggested_action(&self) -> SuggestedAction {
        match self {
            Error::Config(_) => SuggestedAction::RunCheck,
            Error::InvalidConfig(_) => SuggestedAction::ResetConfig,
            Error::InvalidRecord { .. } | Error::Ingest(_) => SuggestedAction::FixInput,
            Error::InsufficientHistory { .. } => SuggestedAction::WidenSelection,
            Error::InvalidRate { .. } => SuggestedAction::ManualIntervention,
            Error::InvalidParameter(_) | Error::WorkBudgetExceeded { .. } => {
                SuggestedAction::ReduceWork
            }
            Error::Io(_) => SuggestedAction::Retry,
            Error::Json(_) => SuggestedAction::ManualIntervention,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Run 'bf-core config validate' to check the forecast configuration."
            }
            Error::InvalidConfig(_) => {
                "Fix the reported field in forecast.json, or remove the file to use built-in defaults."
            }
            Error::InvalidRecord { .. } => {
                "Every record needs a parseable creation timestamp. Fix or drop the reported row."
            }
            Error::Ingest(_) => {
                "Input must be a JSON array or JSON Lines of records with timestamp and status fields."
            }
            Error::InsufficientHistory { .. } => {
                "Widen the author selection or supply records covering at least two calendar weeks."
            }
            Error::InvalidRate { .. } => {
                "A negative or non-finite rate reached the simulator. This is a bug; please report it."
            }
            Error::InvalidParameter(_) => {
                "Number of simulations and number of future weeks must both be at least 1."
            }
            Error::WorkBudgetExceeded { .. } => {
                "Lower --simulations or --weeks, or raise simulation.max_draws in forecast.json."
            }
            Error::Io(_) => "Check that the input path exists and is readable. Retry the operation.",
            Error::Json(_) => "Output serialization failed. This is a bug; please report it.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidConfig(_) => "Invalid Forecast Configuration",
            Error::InvalidRecord { .. } => "Invalid Record",
            Error::InsufficientHistory { .. } => "Not Enough History",
            Error::Ingest(_) => "Unreadable Input",
            Error::InvalidRate { .. } => "Invalid Rate",
            Error::InvalidParameter(_) => "Invalid Simulation Parameter",
            Error::WorkBudgetExceeded { .. } => "Simulation Too Large",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Error",
        }
    }

    /// Format for a terminal: headline, reason and fix.
    pub fn to_human(&self) -> String {
        format!(
            "✗ {}\n  Reason: {}\n  Fix: {}",
            self.headline(),
            self,
            self.remediation()
        )
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Suggested action for agents.
    pub suggested_action: SuggestedAction,

    /// Additional structured context (e.g., record index, group).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::InvalidRecord { index, .. } => {
                context.insert("index".to_string(), serde_json::json!(index));
            }
            Error::InsufficientHistory {
                distinct_weeks,
                required,
            } => {
                context.insert("distinct_weeks".to_string(), serde_json::json!(distinct_weeks));
                context.insert("required".to_string(), serde_json::json!(required));
            }
            Error::InvalidRate { group, rate } => {
                context.insert("group".to_string(), serde_json::json!(group));
                // Non-finite rates serialize as null.
                context.insert("rate".to_string(), serde_json::json!(rate));
            }
            Error::WorkBudgetExceeded { requested, budget } => {
                context.insert("requested".to_string(), serde_json::json!(requested.to_string()));
                context.insert("budget".to_string(), serde_json::json!(budget));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }

    /// Serialize to pretty JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_grouped_by_category() {
        let cases = [
            (Error::Config("x".into()), ErrorCategory::Config, 10..20),
            (
                Error::InvalidRecord {
                    index: 3,
                    reason: "missing timestamp".into(),
                },
                ErrorCategory::Input,
                20..30,
            ),
            (
                Error::InsufficientHistory {
                    distinct_weeks: 1,
                    required: 2,
                },
                ErrorCategory::Estimation,
                20..30,
            ),
            (
                Error::InvalidRate {
                    group: "proj".into(),
                    rate: -1.0,
                },
                ErrorCategory::Simulation,
                30..40,
            ),
        ];
        for (err, category, range) in cases {
            assert_eq!(err.category(), category, "{err}");
            assert!(range.contains(&err.code()), "{err} -> {}", err.code());
        }
    }

    #[test]
    fn invalid_rate_is_fatal() {
        let err = Error::InvalidRate {
            group: "proj".into(),
            rate: f64::NAN,
        };
        assert!(!err.is_recoverable());
        assert_eq!(err.suggested_action(), SuggestedAction::ManualIntervention);
    }

    #[test]
    fn structured_error_carries_context() {
        let err = Error::InsufficientHistory {
            distinct_weeks: 1,
            required: 2,
        };
        let structured = StructuredError::from(&err);
        assert_eq!(structured.code, 21);
        assert_eq!(structured.suggested_action, SuggestedAction::WidenSelection);
        assert_eq!(structured.context["distinct_weeks"], serde_json::json!(1));

        let json = structured.to_json();
        assert!(json.contains(r#""category":"estimation""#));
        assert!(json.contains(r#""suggested_action":"widen_selection""#));
    }

    #[test]
    fn human_format_has_headline_and_fix() {
        let err = Error::InvalidRecord {
            index: 7,
            reason: "missing timestamp".into(),
        };
        let text = err.to_human();
        assert!(text.starts_with("✗ Invalid Record"));
        assert!(text.contains("index 7"));
        assert!(text.contains("Fix:"));
    }
}

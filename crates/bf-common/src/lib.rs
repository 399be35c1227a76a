//! Backlog Forecast common types and errors.
//!
//! This crate provides foundational types shared across the forecast crates:
//! - The event record model consumed by the rate estimator
//! - Common error types with stable codes
//! - Output format selection

pub mod error;
pub mod output;
pub mod record;

pub use error::{Error, ErrorCategory, Result, StructuredError, SuggestedAction};
pub use output::OutputFormat;
pub use record::{parse_timestamp, EventRecord, IssueStatus, StatusCounts};

/// Schema version stamped on every machine-readable payload.
pub const SCHEMA_VERSION: &str = "1.0.0";

//! JSON Schema generation for output types.
//!
//! ```bash
//! # List available schema types
//! bf-core schema --list
//!
//! # Generate schema for a specific type
//! bf-core schema ProjectionResult
//!
//! # Generate all schemas
//! bf-core schema
//! ```

use schemars::schema_for;
use serde_json::Value;
use std::collections::BTreeMap;

pub use crate::aggregate::SeriesProjection;
pub use crate::estimate::{GroupRate, WeekSpan};
pub use crate::output::RateSummary;
pub use crate::report::{ProjectionParameters, ProjectionResult, RoundedTotals};
pub use bf_common::{EventRecord, StatusCounts};
pub use bf_config::ForecastConfig;

/// Available schema types with their descriptions.
pub fn available_schemas() -> Vec<(&'static str, &'static str)> {
    vec![
        // Input
        ("EventRecord", "One historical issue observation"),
        ("ForecastConfig", "forecast.json configuration file"),
        // Estimation
        ("WeekSpan", "Inclusive range of Monday-aligned week indices"),
        ("GroupRate", "Mean weekly rate for one group"),
        ("RateSummary", "Output of the rates command"),
        // Projection
        ("SeriesProjection", "Weekly and cumulative expectation for one status"),
        ("ProjectionParameters", "Parameters a projection was produced with"),
        ("StatusCounts", "Current open/closed totals"),
        ("RoundedTotals", "Estimated totals rounded for display"),
        (
            "ProjectionResult",
            "Complete OPEN and CLOSED projection report",
        ),
    ]
}

/// Generate JSON Schema for a type by name.
///
/// Returns `None` if the type is unknown.
pub fn generate_schema(type_name: &str) -> Option<Value> {
    let schema = match type_name {
        "EventRecord" => schema_for!(EventRecord),
        "ForecastConfig" => schema_for!(ForecastConfig),
        "WeekSpan" => schema_for!(WeekSpan),
        "GroupRate" => schema_for!(GroupRate),
        "RateSummary" => schema_for!(RateSummary),
        "SeriesProjection" => schema_for!(SeriesProjection),
        "ProjectionParameters" => schema_for!(ProjectionParameters),
        "StatusCounts" => schema_for!(StatusCounts),
        "RoundedTotals" => schema_for!(RoundedTotals),
        "ProjectionResult" => schema_for!(ProjectionResult),
        _ => return None,
    };
    serde_json::to_value(schema).ok()
}

/// Generate all schemas as a map from type name to schema.
pub fn generate_all_schemas() -> BTreeMap<String, Value> {
    available_schemas()
        .into_iter()
        .filter_map(|(name, _)| generate_schema(name).map(|s| (name.to_string(), s)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_listed_schemas_generate() {
        for (name, _desc) in available_schemas() {
            assert!(generate_schema(name).is_some(), "schema for {name}");
        }
    }

    #[test]
    fn unknown_schema_returns_none() {
        assert!(generate_schema("Plan").is_none());
        assert!(generate_schema("").is_none());
    }

    #[test]
    fn projection_schema_names_series_fields() {
        let schema = generate_schema("ProjectionResult").unwrap();
        let properties = schema["properties"].as_object().unwrap();
        for field in [
            "current_open_count",
            "weekly_expected_opened",
            "cumulative_closed",
            "total_estimated_closed",
        ] {
            assert!(properties.contains_key(field), "{field}");
        }
    }

    #[test]
    fn all_schemas_map() {
        let all = generate_all_schemas();
        assert_eq!(all.len(), available_schemas().len());
        assert!(all.contains_key("ForecastConfig"));
    }
}

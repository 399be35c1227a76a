//! Backlog Forecast Core Library
//!
//! This library provides the projection engine behind the `bf-core` binary:
//! - Record ingestion and author filtering
//! - Weekly rate estimation over Monday-aligned calendar weeks
//! - Parallel, seedable Monte Carlo simulation of Poisson weekly counts
//! - Trial aggregation into weekly and cumulative expectations
//! - Report assembly, rendering and JSON Schema export
//!
//! The binary entry point is in `main.rs`.

pub mod aggregate;
pub mod error;
pub mod estimate;
pub mod exit_codes;
pub mod ingest;
pub mod logging;
pub mod output;
pub mod report;
pub mod schema;
pub mod simulate;

pub use aggregate::{aggregate, weekly_means, SeriesProjection, TOTAL_IDENTITY_REL_TOL};
pub use error::{ForecastError, Result};
pub use estimate::{
    estimate_weekly_rates, estimate_weekly_rates_with, GroupRate, RateEstimate, WeekSpan,
    WeeklyBucketSeries,
};
pub use report::{
    build_projection_report, estimate_and_simulate, estimate_and_simulate_from, series_seed,
    ProjectionEngine, ProjectionParameters, ProjectionRequest, ProjectionResult, RoundedTotals,
};
pub use simulate::{MonteCarloSimulator, SimulationParams, SimulationTrialMatrix, MAX_TRIAL_CELLS};

pub use bf_common::{EventRecord, IssueStatus, StatusCounts};
pub use bf_config::{GroupBy, TotalRounding};

//! Projection report: estimate, simulate and aggregate for OPEN and CLOSED.
//!
//! The two series run independently. Each series draws from a seed derived
//! from the run seed and its status, so asking for one series alone gives the
//! same numbers as the corresponding half of a full report.

use bf_common::{EventRecord, IssueStatus, StatusCounts, SCHEMA_VERSION};
use bf_config::{EstimationSettings, ForecastConfig, GroupBy, TotalRounding};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aggregate::{aggregate, SeriesProjection};
use crate::error::Result;
use crate::estimate::{estimate_weekly_rates_with, RateEstimate};
use crate::logging::event_names;
use crate::simulate::{MonteCarloSimulator, SimulationParams};

/// Seed used for one status series within a run.
pub fn series_seed(run_seed: u64, status: IssueStatus) -> u64 {
    match status {
        IssueStatus::Open => run_seed,
        IssueStatus::Closed => run_seed.rotate_left(32) ^ 0x9E37_79B9_7F4A_7C15,
    }
}

/// Parameters a projection was produced with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProjectionParameters {
    pub num_simulations: usize,
    pub num_weeks_future: usize,
    /// Run seed; replaying with it reproduces the projection.
    pub seed: u64,
    pub group_by: GroupBy,
}

/// Current totals plus the projected OPEN and CLOSED trajectories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProjectionResult {
    pub schema_version: String,
    pub current_open_count: u64,
    pub current_closed_count: u64,
    pub weekly_expected_opened: Vec<f64>,
    pub weekly_expected_closed: Vec<f64>,
    pub cumulative_opened: Vec<f64>,
    pub cumulative_closed: Vec<f64>,
    pub total_estimated_opened: f64,
    pub total_estimated_closed: f64,
    pub parameters: ProjectionParameters,
}

/// Estimated totals converted for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RoundedTotals {
    pub opened: i64,
    pub closed: i64,
    pub rounding: TotalRounding,
}

impl ProjectionResult {
    fn from_series(
        current: StatusCounts,
        opened: SeriesProjection,
        closed: SeriesProjection,
        parameters: ProjectionParameters,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            current_open_count: current.open,
            current_closed_count: current.closed,
            weekly_expected_opened: opened.weekly_expected,
            weekly_expected_closed: closed.weekly_expected,
            cumulative_opened: opened.cumulative,
            cumulative_closed: closed.cumulative,
            total_estimated_opened: opened.total_estimate,
            total_estimated_closed: closed.total_estimate,
            parameters,
        }
    }

    /// One series of the report.
    pub fn series(&self, status: IssueStatus) -> SeriesProjection {
        match status {
            IssueStatus::Open => SeriesProjection {
                weekly_expected: self.weekly_expected_opened.clone(),
                cumulative: self.cumulative_opened.clone(),
                total_estimate: self.total_estimated_opened,
            },
            IssueStatus::Closed => SeriesProjection {
                weekly_expected: self.weekly_expected_closed.clone(),
                cumulative: self.cumulative_closed.clone(),
                total_estimate: self.total_estimated_closed,
            },
        }
    }

    pub fn rounded_totals(&self, rounding: TotalRounding) -> RoundedTotals {
        RoundedTotals {
            opened: rounding.apply(self.total_estimated_opened),
            closed: rounding.apply(self.total_estimated_closed),
            rounding,
        }
    }
}

/// Input to [`ProjectionEngine::project`].
#[derive(Debug, Clone, Copy)]
pub struct ProjectionRequest<'a> {
    pub records: &'a [EventRecord],
    pub current: StatusCounts,
}

impl<'a> ProjectionRequest<'a> {
    pub fn new(records: &'a [EventRecord], current: StatusCounts) -> Self {
        Self { records, current }
    }

    /// Use the record set's own open/closed counts as the current totals.
    pub fn from_records(records: &'a [EventRecord]) -> Self {
        Self::new(records, StatusCounts::from_records(records))
    }
}

/// Configured estimate → simulate → aggregate pipeline.
#[derive(Debug, Clone)]
pub struct ProjectionEngine {
    simulation: SimulationParams,
    estimation: EstimationSettings,
}

impl ProjectionEngine {
    pub fn new(simulation: SimulationParams, estimation: EstimationSettings) -> Self {
        Self {
            simulation,
            estimation,
        }
    }

    pub fn from_config(config: &ForecastConfig) -> Self {
        Self::new(
            SimulationParams::from_settings(&config.simulation),
            config.estimation.clone(),
        )
    }

    pub fn simulation(&self) -> &SimulationParams {
        &self.simulation
    }

    pub fn estimation(&self) -> &EstimationSettings {
        &self.estimation
    }

    /// Weekly rates for one status under the configured policy.
    pub fn estimate(&self, records: &[EventRecord], status: IssueStatus) -> Result<RateEstimate> {
        estimate_weekly_rates_with(records, status, &self.estimation)
    }

    /// Project one series from an explicit run seed.
    pub fn project_series(
        &self,
        records: &[EventRecord],
        status: IssueStatus,
        current_total: f64,
        run_seed: u64,
    ) -> Result<SeriesProjection> {
        self.simulation.validate()?;
        let rates = self.estimate(records, status)?;
        let matrix = MonteCarloSimulator::new(self.simulation.clone())
            .simulate_seeded(&rates, series_seed(run_seed, status))?;
        let projection = aggregate(&matrix, current_total);

        debug!(
            target: event_names::AGGREGATE_FINISHED,
            status = %status,
            total_rate = rates.total_rate(),
            total_estimate = projection.total_estimate,
            "series aggregated"
        );
        Ok(projection)
    }

    /// Build the full OPEN + CLOSED report.
    pub fn project(&self, request: &ProjectionRequest<'_>) -> Result<ProjectionResult> {
        let run_seed = self.simulation.resolve_seed();

        let opened = self.project_series(
            request.records,
            IssueStatus::Open,
            request.current.open as f64,
            run_seed,
        )?;
        let closed = self.project_series(
            request.records,
            IssueStatus::Closed,
            request.current.closed as f64,
            run_seed,
        )?;

        let parameters = ProjectionParameters {
            num_simulations: self.simulation.num_simulations,
            num_weeks_future: self.simulation.num_weeks_future,
            seed: run_seed,
            group_by: self.estimation.group_by,
        };

        info!(
            target: event_names::REPORT_FINISHED,
            records = request.records.len(),
            num_simulations = parameters.num_simulations,
            num_weeks_future = parameters.num_weeks_future,
            total_estimated_opened = opened.total_estimate,
            total_estimated_closed = closed.total_estimate,
            "projection built"
        );

        Ok(ProjectionResult::from_series(
            request.current,
            opened,
            closed,
            parameters,
        ))
    }
}

fn engine_for(
    group_by: GroupBy,
    num_simulations: usize,
    num_weeks_future: usize,
    seed: Option<u64>,
) -> ProjectionEngine {
    let mut simulation = SimulationParams::new(num_simulations, num_weeks_future);
    simulation.seed = seed;
    ProjectionEngine::new(
        simulation,
        EstimationSettings {
            group_by,
            ..EstimationSettings::default()
        },
    )
}

/// Estimate rates for `status` and project them with no offset.
pub fn estimate_and_simulate(
    records: &[EventRecord],
    status: IssueStatus,
    group_by: GroupBy,
    num_simulations: usize,
    num_weeks_future: usize,
    seed: Option<u64>,
) -> Result<SeriesProjection> {
    estimate_and_simulate_from(
        0.0,
        records,
        status,
        group_by,
        num_simulations,
        num_weeks_future,
        seed,
    )
}

/// Estimate rates for `status` and project them on top of `current_total`.
pub fn estimate_and_simulate_from(
    current_total: f64,
    records: &[EventRecord],
    status: IssueStatus,
    group_by: GroupBy,
    num_simulations: usize,
    num_weeks_future: usize,
    seed: Option<u64>,
) -> Result<SeriesProjection> {
    let engine = engine_for(group_by, num_simulations, num_weeks_future, seed);
    let run_seed = engine.simulation().resolve_seed();
    engine.project_series(records, status, current_total, run_seed)
}

/// Build an ungrouped OPEN + CLOSED projection report.
pub fn build_projection_report(
    records: &[EventRecord],
    current_open_count: u64,
    current_closed_count: u64,
    num_simulations: usize,
    num_weeks_future: usize,
    seed: Option<u64>,
) -> Result<ProjectionResult> {
    let engine = engine_for(GroupBy::Ungrouped, num_simulations, num_weeks_future, seed);
    engine.project(&ProjectionRequest::new(
        records,
        StatusCounts {
            open: current_open_count,
            closed: current_closed_count,
        },
    ))
}

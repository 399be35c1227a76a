//! Trial aggregation: average first, then accumulate.

use bf_math::{approx_eq_rel, cumulative_sum, neumaier_sum};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::simulate::SimulationTrialMatrix;

/// Tolerance for the `total == current + sum(weekly)` identity.
pub const TOTAL_IDENTITY_REL_TOL: f64 = 1e-9;

/// Expected trajectory of one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SeriesProjection {
    /// Mean over trials of each future week's draw.
    pub weekly_expected: Vec<f64>,
    /// `current_total` plus the running sum of `weekly_expected`.
    pub cumulative: Vec<f64>,
    /// Last cumulative value.
    pub total_estimate: f64,
}

impl SeriesProjection {
    /// Check `total_estimate == offset + sum(weekly_expected)` within tolerance.
    pub fn satisfies_total_identity(&self, current_total: f64) -> bool {
        let expected = current_total + neumaier_sum(&self.weekly_expected);
        approx_eq_rel(self.total_estimate, expected, TOTAL_IDENTITY_REL_TOL)
    }
}

/// Elementwise mean across trials for each future week.
pub fn weekly_means(matrix: &SimulationTrialMatrix) -> Vec<f64> {
    let trials = matrix.num_trials();
    if trials == 0 {
        return vec![0.0; matrix.num_weeks()];
    }
    // Integer column sums are exact; divide once.
    let mut sums = vec![0u128; matrix.num_weeks()];
    for row in matrix.trials() {
        for (sum, v) in sums.iter_mut().zip(row) {
            *sum += u128::from(*v);
        }
    }
    sums.into_iter()
        .map(|s| s as f64 / trials as f64)
        .collect()
}

/// Aggregate a trial matrix into a projection offset by `current_total`.
pub fn aggregate(matrix: &SimulationTrialMatrix, current_total: f64) -> SeriesProjection {
    from_weekly_expected(weekly_means(matrix), current_total)
}

/// Build the cumulative series and total from already-averaged weeks.
pub fn from_weekly_expected(weekly_expected: Vec<f64>, current_total: f64) -> SeriesProjection {
    let cumulative = cumulative_sum(current_total, &weekly_expected);
    let total_estimate = cumulative.last().copied().unwrap_or(current_total);
    SeriesProjection {
        weekly_expected,
        cumulative,
        total_estimate,
    }
}

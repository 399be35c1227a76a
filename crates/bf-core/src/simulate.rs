//! Monte Carlo simulation of weekly Poisson arrivals.
//!
//! Every trial draws on its own ChaCha8 stream keyed by (seed, trial index),
//! so a seeded run is bit-identical regardless of how rayon schedules trials.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Poisson};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{ForecastError, Result};
use crate::estimate::RateEstimate;
use crate::logging::event_names;

/// Hard cap on materialized `trials × weeks` cells (8 bytes each), applied
/// whatever `max_draws` is configured to.
pub const MAX_TRIAL_CELLS: u64 = 100_000_000;

/// Parameters for one simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationParams {
    pub num_simulations: usize,
    pub num_weeks_future: usize,
    /// `None` draws a seed from OS entropy.
    pub seed: Option<u64>,
    /// Cap on `trials × weeks × groups`.
    pub max_draws: u64,
    /// Worker threads; `None` uses the global rayon pool.
    pub threads: Option<usize>,
}

impl SimulationParams {
    pub fn new(num_simulations: usize, num_weeks_future: usize) -> Self {
        Self {
            num_simulations,
            num_weeks_future,
            seed: None,
            max_draws: bf_config::forecast::DEFAULT_MAX_DRAWS,
            threads: None,
        }
    }

    pub fn from_settings(settings: &bf_config::SimulationSettings) -> Self {
        Self {
            num_simulations: settings.num_simulations,
            num_weeks_future: settings.num_weeks_future,
            seed: settings.seed,
            max_draws: settings.max_draws,
            threads: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_draws(mut self, max_draws: u64) -> Self {
        self.max_draws = max_draws;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Reject zero trials or a zero horizon.
    pub fn validate(&self) -> Result<()> {
        if self.num_simulations == 0 {
            return Err(ForecastError::InvalidParameter(
                "num_simulations must be greater than 0".to_string(),
            ));
        }
        if self.num_weeks_future == 0 {
            return Err(ForecastError::InvalidParameter(
                "num_weeks_future must be greater than 0".to_string(),
            ));
        }
        if self.threads == Some(0) {
            return Err(ForecastError::InvalidParameter(
                "threads must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Poisson draws needed for `groups` independent processes.
    pub fn required_draws(&self, groups: usize) -> u128 {
        self.num_simulations as u128 * self.num_weeks_future as u128 * groups.max(1) as u128
    }

    /// The configured seed, or a fresh one from OS entropy.
    ///
    /// Entropy seeds are logged so an unseeded run can be replayed.
    pub fn resolve_seed(&self) -> u64 {
        match self.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::random::<u64>();
                debug!(
                    target: event_names::SIMULATE_SEEDED,
                    seed,
                    "drew simulation seed from entropy"
                );
                seed
            }
        }
    }
}

/// Per-trial, per-week draws, stored row-major (one row per trial).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationTrialMatrix {
    num_weeks: usize,
    values: Vec<u64>,
    seed: u64,
}

impl SimulationTrialMatrix {
    pub fn num_trials(&self) -> usize {
        if self.num_weeks == 0 {
            0
        } else {
            self.values.len() / self.num_weeks
        }
    }

    pub fn num_weeks(&self) -> usize {
        self.num_weeks
    }

    /// Seed the matrix was drawn with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn trial(&self, index: usize) -> Option<&[u64]> {
        self.trials().nth(index)
    }

    pub fn trials(&self) -> std::slice::ChunksExact<'_, u64> {
        self.values.chunks_exact(self.num_weeks.max(1))
    }

    /// All draws, trial-major.
    pub fn as_slice(&self) -> &[u64] {
        &self.values
    }
}

/// Draws independent Poisson trials for a [`RateEstimate`].
#[derive(Debug, Clone)]
pub struct MonteCarloSimulator {
    params: SimulationParams,
}

impl MonteCarloSimulator {
    pub fn new(params: SimulationParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Run all trials with the configured (or an entropy) seed.
    pub fn simulate(&self, rates: &RateEstimate) -> Result<SimulationTrialMatrix> {
        let seed = self.params.resolve_seed();
        self.simulate_seeded(rates, seed)
    }

    /// Run all trials on streams derived from `seed`.
    ///
    /// Fails before sampling on invalid parameters, invalid rates or an
    /// exceeded draw budget.
    pub fn simulate_seeded(&self, rates: &RateEstimate, seed: u64) -> Result<SimulationTrialMatrix> {
        self.params.validate()?;

        let requested = self.params.required_draws(rates.len());
        if requested > u128::from(self.params.max_draws) {
            return Err(ForecastError::WorkBudgetExceeded {
                requested,
                budget: self.params.max_draws,
            });
        }

        let samplers = rates
            .groups()
            .iter()
            .map(|g| GroupSampler::new(g.label(), g.weekly_rate))
            .collect::<Result<Vec<_>>>()?;

        let num_weeks = self.params.num_weeks_future;
        let mut values = allocate_cells(self.params.num_simulations, num_weeks)?;

        let fill = |values: &mut [u64]| {
            values
                .par_chunks_mut(num_weeks)
                .enumerate()
                .for_each(|(trial, row)| draw_trial(seed, trial as u64, &samplers, row));
        };

        match self.params.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| ForecastError::InvalidParameter(format!("thread pool: {e}")))?;
                pool.install(|| fill(&mut values));
            }
            None => fill(&mut values),
        }

        debug!(
            target: event_names::SIMULATE_FINISHED,
            trials = self.params.num_simulations,
            weeks = num_weeks,
            groups = samplers.len(),
            seed,
            "simulation finished"
        );

        Ok(SimulationTrialMatrix {
            num_weeks,
            values,
            seed,
        })
    }
}

/// Poisson sampler for one group. Rate 0 is the point mass at 0.
#[derive(Debug, Clone)]
enum GroupSampler {
    Zero,
    Poisson(Poisson<f64>),
}

impl GroupSampler {
    fn new(group: &str, rate: f64) -> Result<Self> {
        let invalid = || ForecastError::InvalidRate {
            group: group.to_string(),
            rate,
        };
        if !rate.is_finite() || rate < 0.0 {
            return Err(invalid());
        }
        if rate == 0.0 {
            return Ok(GroupSampler::Zero);
        }
        Poisson::new(rate)
            .map(GroupSampler::Poisson)
            .map_err(|_| invalid())
    }

    fn sample(&self, rng: &mut ChaCha8Rng) -> u64 {
        match self {
            GroupSampler::Zero => 0,
            GroupSampler::Poisson(dist) => dist.sample(rng) as u64,
        }
    }
}

/// Zeroed trial matrix storage, refused rather than aborting when too large.
fn allocate_cells(trials: usize, weeks: usize) -> Result<Vec<u64>> {
    let requested = trials as u128 * weeks as u128;
    let exceeded = || ForecastError::WorkBudgetExceeded {
        requested,
        budget: MAX_TRIAL_CELLS,
    };
    if requested > u128::from(MAX_TRIAL_CELLS) {
        return Err(exceeded());
    }
    let cells = trials * weeks;
    let mut values = Vec::new();
    values.try_reserve_exact(cells).map_err(|_| exceeded())?;
    values.resize(cells, 0u64);
    Ok(values)
}

/// Fill one trial row. Draw order is week-major, then group order.
fn draw_trial(seed: u64, trial: u64, samplers: &[GroupSampler], row: &mut [u64]) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(trial);
    for cell in row.iter_mut() {
        *cell = samplers.iter().map(|s| s.sample(&mut rng)).sum();
    }
}

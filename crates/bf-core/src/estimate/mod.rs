//! Weekly rate estimation.
//!
//! Records are bucketed into Monday-aligned calendar weeks, gaps are
//! zero-filled over the observed span and each group's rate is the mean count
//! per spanned week.

pub mod rate;
pub mod week;

pub use rate::{
    estimate_weekly_rates, estimate_weekly_rates_with, GroupRate, RateEstimate,
    WeeklyBucketSeries, MIN_DISTINCT_WEEKS,
};
pub use week::{week_index, week_start, WeekSpan};

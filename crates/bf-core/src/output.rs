//! Rendering of command payloads as Markdown and one-line summaries.
//!
//! JSON output is the serde form of the payload types and is assembled in
//! `main.rs`; this module covers the human formats.

use std::fmt::{self, Write};

use bf_common::{IssueStatus, SCHEMA_VERSION};
use bf_config::{GroupBy, TotalRounding};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::estimate::{GroupRate, RateEstimate};
use crate::report::ProjectionResult;

/// Payload of the `rates` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RateSummary {
    pub schema_version: String,
    pub status: IssueStatus,
    pub group_by: GroupBy,
    /// Monday of the first observed week.
    pub first_week: Option<NaiveDate>,
    /// Monday of the last observed week.
    pub last_week: Option<NaiveDate>,
    /// Calendar weeks in the span, zero weeks included.
    pub spanned_weeks: usize,
    /// Weeks with at least one record of any status.
    pub distinct_weeks: usize,
    /// Sum of all group rates.
    pub total_rate: f64,
    pub groups: Vec<GroupRate>,
}

impl RateSummary {
    pub fn new(status: IssueStatus, group_by: GroupBy, estimate: &RateEstimate) -> Self {
        let span = estimate.span();
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            status,
            group_by,
            first_week: span.and_then(|s| s.first_monday()),
            last_week: span.and_then(|s| s.last_monday()),
            spanned_weeks: span.map_or(0, |s| s.len()),
            distinct_weeks: estimate.distinct_weeks(),
            total_rate: estimate.total_rate(),
            groups: estimate.groups().to_vec(),
        }
    }
}

fn fmt_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.to_string())
}

/// Markdown report: metric cards, then one row per future week.
pub fn write_projection_md<W: Write>(
    w: &mut W,
    result: &ProjectionResult,
    rounding: TotalRounding,
) -> fmt::Result {
    let totals = result.rounded_totals(rounding);
    let params = &result.parameters;

    writeln!(w, "# Backlog Forecast")?;
    writeln!(w)?;
    writeln!(
        w,
        "{} simulations, {} weeks, seed {}, {}",
        params.num_simulations, params.num_weeks_future, params.seed, params.group_by
    )?;
    writeln!(w)?;
    writeln!(w, "| Metric | Value |")?;
    writeln!(w, "|---|---:|")?;
    writeln!(w, "| Open issues | {} |", result.current_open_count)?;
    writeln!(w, "| Closed issues | {} |", result.current_closed_count)?;
    writeln!(w, "| Estimated open issues | {} |", totals.opened)?;
    writeln!(w, "| Estimated closed issues | {} |", totals.closed)?;
    writeln!(w)?;
    writeln!(
        w,
        "| Week | Opened (weekly) | Opened (cumulative) | Closed (weekly) | Closed (cumulative) |"
    )?;
    writeln!(w, "|---:|---:|---:|---:|---:|")?;
    let rows = result
        .weekly_expected_opened
        .iter()
        .zip(&result.cumulative_opened)
        .zip(result.weekly_expected_closed.iter().zip(&result.cumulative_closed));
    for (week, ((wo, co), (wc, cc))) in rows.enumerate() {
        writeln!(
            w,
            "| {} | {:.2} | {:.2} | {:.2} | {:.2} |",
            week + 1,
            wo,
            co,
            wc,
            cc
        )?;
    }
    Ok(())
}

pub fn render_projection_md(result: &ProjectionResult, rounding: TotalRounding) -> String {
    let mut out = String::new();
    let _ = write_projection_md(&mut out, result, rounding);
    out
}

/// One line: current and estimated totals for both series.
pub fn render_projection_summary(result: &ProjectionResult, rounding: TotalRounding) -> String {
    let totals = result.rounded_totals(rounding);
    format!(
        "open {} -> {}, closed {} -> {} over {} weeks ({} simulations, seed {})",
        result.current_open_count,
        totals.opened,
        result.current_closed_count,
        totals.closed,
        result.parameters.num_weeks_future,
        result.parameters.num_simulations,
        result.parameters.seed
    )
}

pub fn write_rates_md<W: Write>(w: &mut W, summary: &RateSummary) -> fmt::Result {
    writeln!(w, "# Weekly Rates ({})", summary.status)?;
    writeln!(w)?;
    writeln!(
        w,
        "Weeks {} to {}: {} spanned, {} observed",
        fmt_date(summary.first_week),
        fmt_date(summary.last_week),
        summary.spanned_weeks,
        summary.distinct_weeks
    )?;
    writeln!(w)?;
    writeln!(w, "| Group | Records | Weekly rate |")?;
    writeln!(w, "|---|---:|---:|")?;
    for group in &summary.groups {
        writeln!(
            w,
            "| {} | {} | {:.4} |",
            group.label(),
            group.matching_records,
            group.weekly_rate
        )?;
    }
    writeln!(w, "| **total** | | {:.4} |", summary.total_rate)
}

pub fn render_rates_md(summary: &RateSummary) -> String {
    let mut out = String::new();
    let _ = write_rates_md(&mut out, summary);
    out
}

pub fn render_rates_summary(summary: &RateSummary) -> String {
    format!(
        "{} rate {:.4}/week across {} group(s), {} weeks spanned",
        summary.status,
        summary.total_rate,
        summary.groups.len(),
        summary.spanned_weeks
    )
}

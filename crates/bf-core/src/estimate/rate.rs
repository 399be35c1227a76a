//! Weekly bucketing and mean-rate estimation.

use std::collections::{BTreeMap, BTreeSet};

use bf_common::{EventRecord, IssueStatus};
use bf_config::{EstimationSettings, GroupBy};
use bf_math::neumaier_sum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::week::{week_index, WeekSpan};
use crate::error::{ForecastError, Result};
use crate::logging::event_names;

/// Hard floor on the distinct-weeks policy: one week carries no rate signal.
pub const MIN_DISTINCT_WEEKS: usize = 2;

/// Zero-filled per-week counts over a contiguous span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyBucketSeries {
    span: WeekSpan,
    counts: Vec<u64>,
}

impl WeeklyBucketSeries {
    pub fn zero_filled(span: WeekSpan) -> Self {
        Self {
            span,
            counts: vec![0; span.len()],
        }
    }

    /// Count one event in `week`. Weeks outside the span are ignored.
    pub fn record(&mut self, week: i64) {
        if self.span.contains(week) {
            self.counts[(week - self.span.first) as usize] += 1;
        }
    }

    pub fn span(&self) -> WeekSpan {
        self.span
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// `(week_index, count)` pairs in increasing week order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, u64)> + '_ {
        let first = self.span.first;
        self.counts
            .iter()
            .enumerate()
            .map(move |(i, c)| (first + i as i64, *c))
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Mean count per week over the whole span, zero weeks included.
    ///
    /// The integer total is exact, so this is a single rounded division.
    pub fn mean_rate(&self) -> f64 {
        if self.counts.is_empty() {
            return 0.0;
        }
        self.total() as f64 / self.counts.len() as f64
    }
}

/// Estimated mean weekly rate for one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GroupRate {
    /// Group key; `None` for the implicit ungrouped key or records without one.
    pub group: Option<String>,
    /// Mean events per week.
    pub weekly_rate: f64,
    /// Records of the estimated status in this group.
    pub matching_records: u64,
}

impl GroupRate {
    /// Display label for logs and error messages.
    pub fn label(&self) -> &str {
        self.group.as_deref().unwrap_or("(ungrouped)")
    }
}

/// Per-group weekly rates in sorted key order.
#[derive(Debug, Clone, PartialEq)]
pub struct RateEstimate {
    groups: Vec<GroupRate>,
    span: Option<WeekSpan>,
    distinct_weeks: usize,
}

impl RateEstimate {
    /// A single ungrouped rate. The value is checked by the simulator.
    pub fn single(rate: f64) -> Self {
        Self::from_rates([(None, rate)])
    }

    /// Build from explicit `(group, rate)` pairs, sorted by group key.
    ///
    /// No validation happens here; the simulator rejects negative and
    /// non-finite rates.
    pub fn from_rates(rates: impl IntoIterator<Item = (Option<String>, f64)>) -> Self {
        let mut groups: Vec<GroupRate> = rates
            .into_iter()
            .map(|(group, weekly_rate)| GroupRate {
                group,
                weekly_rate,
                matching_records: 0,
            })
            .collect();
        groups.sort_by(|a, b| a.group.cmp(&b.group));
        Self {
            groups,
            span: None,
            distinct_weeks: 0,
        }
    }

    pub fn groups(&self) -> &[GroupRate] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn rate(&self, group: Option<&str>) -> Option<f64> {
        self.groups
            .iter()
            .find(|g| g.group.as_deref() == group)
            .map(|g| g.weekly_rate)
    }

    /// Sum of all group rates (the superposed process rate).
    pub fn total_rate(&self) -> f64 {
        let rates: Vec<f64> = self.groups.iter().map(|g| g.weekly_rate).collect();
        neumaier_sum(&rates)
    }

    /// Observed week span, when estimated from records.
    pub fn span(&self) -> Option<WeekSpan> {
        self.span
    }

    pub fn distinct_weeks(&self) -> usize {
        self.distinct_weeks
    }
}

/// Estimate weekly rates with the default history policy.
pub fn estimate_weekly_rates(
    records: &[EventRecord],
    status: IssueStatus,
    group_by: GroupBy,
) -> Result<RateEstimate> {
    estimate_weekly_rates_with(
        records,
        status,
        &EstimationSettings {
            group_by,
            ..EstimationSettings::default()
        },
    )
}

/// Estimate weekly rates for `status`.
///
/// The week span is taken over every record handed in (all statuses) and is
/// shared by all groups. Groups are the distinct keys present anywhere in the
/// record set, so a group with no records of `status` gets rate 0.
pub fn estimate_weekly_rates_with(
    records: &[EventRecord],
    status: IssueStatus,
    settings: &EstimationSettings,
) -> Result<RateEstimate> {
    let required = settings.min_distinct_weeks.max(MIN_DISTINCT_WEEKS);

    let mut weeks = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let ts = record.timestamp.ok_or_else(|| ForecastError::InvalidRecord {
            index,
            reason: "missing timestamp".to_string(),
        })?;
        weeks.push(week_index(&ts));
    }

    let distinct_weeks = weeks.iter().collect::<BTreeSet<_>>().len();
    if distinct_weeks < required {
        return Err(ForecastError::InsufficientHistory {
            distinct_weeks,
            required,
        });
    }
    let span = WeekSpan::covering(weeks.iter().copied()).ok_or(
        ForecastError::InsufficientHistory {
            distinct_weeks,
            required,
        },
    )?;

    let mut buckets: BTreeMap<Option<&str>, WeeklyBucketSeries> = BTreeMap::new();
    for (record, week) in records.iter().zip(&weeks) {
        let key = match settings.group_by {
            GroupBy::Ungrouped => None,
            GroupBy::GroupKey => record.group_key.as_deref(),
        };
        let series = buckets
            .entry(key)
            .or_insert_with(|| WeeklyBucketSeries::zero_filled(span));
        if record.status == status {
            series.record(*week);
        }
    }

    let groups: Vec<GroupRate> = buckets
        .into_iter()
        .map(|(key, series)| GroupRate {
            group: key.map(str::to_string),
            weekly_rate: series.mean_rate(),
            matching_records: series.total(),
        })
        .collect();

    debug!(
        target: event_names::ESTIMATE_FINISHED,
        status = %status,
        group_by = %settings.group_by,
        groups = groups.len(),
        weeks_spanned = span.len(),
        distinct_weeks,
        "weekly rates estimated"
    );

    Ok(RateEstimate {
        groups,
        span: Some(span),
        distinct_weeks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn week(n: i64) -> DateTime<Utc> {
        // 2024-01-01 is a Monday; add a weekday offset inside the week.
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap() + Duration::weeks(n) + Duration::days(2)
    }

    fn open(n: i64) -> EventRecord {
        EventRecord::new(week(n), IssueStatus::Open)
    }

    fn closed(n: i64) -> EventRecord {
        EventRecord::new(week(n), IssueStatus::Closed)
    }

    #[test]
    fn zero_filled_mean_over_full_span() {
        // Week 0: 3 open, week 1: nothing, week 2: 3 open. 6 / 3 weeks.
        let records: Vec<_> = [0, 0, 0, 2, 2, 2].into_iter().map(open).collect();
        let est = estimate_weekly_rates(&records, IssueStatus::Open, GroupBy::Ungrouped).unwrap();
        assert_eq!(est.len(), 1);
        assert!((est.rate(None).unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(est.span().unwrap().len(), 3);
        assert_eq!(est.distinct_weeks(), 2);
    }

    #[test]
    fn span_includes_other_status() {
        // Open records only in weeks 0 and 1; a closed record stretches the span to week 3.
        let records = vec![open(0), open(0), open(1), open(1), closed(3)];
        let est = estimate_weekly_rates(&records, IssueStatus::Open, GroupBy::Ungrouped).unwrap();
        assert!((est.rate(None).unwrap() - 1.0).abs() < 1e-12);

        let est = estimate_weekly_rates(&records, IssueStatus::Closed, GroupBy::Ungrouped).unwrap();
        assert!((est.rate(None).unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn group_without_matching_status_has_zero_rate() {
        let records = vec![
            open(0).with_group_key("alpha"),
            open(1).with_group_key("alpha"),
            closed(1).with_group_key("beta"),
        ];
        let est = estimate_weekly_rates(&records, IssueStatus::Open, GroupBy::GroupKey).unwrap();
        assert_eq!(est.len(), 2);
        assert_eq!(est.rate(Some("alpha")), Some(1.0));
        assert_eq!(est.rate(Some("beta")), Some(0.0));
    }

    #[test]
    fn groups_share_the_global_span() {
        let records = vec![
            open(0).with_group_key("b"),
            open(3).with_group_key("a"),
            open(3).with_group_key("a"),
        ];
        let est = estimate_weekly_rates(&records, IssueStatus::Open, GroupBy::GroupKey).unwrap();
        let keys: Vec<_> = est.groups().iter().map(|g| g.label().to_string()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!((est.rate(Some("a")).unwrap() - 0.5).abs() < 1e-12);
        assert!((est.rate(Some("b")).unwrap() - 0.25).abs() < 1e-12);
        assert!((est.total_rate() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn records_without_key_form_their_own_group() {
        let records = vec![open(0).with_group_key("a"), open(1)];
        let est = estimate_weekly_rates(&records, IssueStatus::Open, GroupBy::GroupKey).unwrap();
        assert_eq!(est.groups()[0].group, None);
        assert_eq!(est.rate(None), Some(0.5));
    }

    #[test]
    fn single_week_is_insufficient() {
        let records = vec![open(4), open(4), closed(4)];
        let err =
            estimate_weekly_rates(&records, IssueStatus::Open, GroupBy::Ungrouped).unwrap_err();
        assert_eq!(
            err,
            ForecastError::InsufficientHistory {
                distinct_weeks: 1,
                required: 2
            }
        );
    }

    #[test]
    fn empty_input_is_insufficient() {
        let err = estimate_weekly_rates(&[], IssueStatus::Open, GroupBy::Ungrouped).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InsufficientHistory {
                distinct_weeks: 0,
                ..
            }
        ));
    }

    #[test]
    fn stricter_history_policy() {
        let records = vec![open(0), open(5)];
        let settings = EstimationSettings {
            group_by: GroupBy::Ungrouped,
            min_distinct_weeks: 3,
        };
        let err = estimate_weekly_rates_with(&records, IssueStatus::Open, &settings).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InsufficientHistory { required: 3, .. }
        ));
    }

    #[test]
    fn policy_never_drops_below_two_weeks() {
        let records = vec![open(0)];
        let settings = EstimationSettings {
            group_by: GroupBy::Ungrouped,
            min_distinct_weeks: 0,
        };
        assert!(estimate_weekly_rates_with(&records, IssueStatus::Open, &settings).is_err());
    }

    #[test]
    fn missing_timestamp_names_the_index() {
        let mut broken = open(1);
        broken.timestamp = None;
        let records = vec![open(0), broken];
        let err =
            estimate_weekly_rates(&records, IssueStatus::Open, GroupBy::Ungrouped).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidRecord { index: 1, .. }));
    }

    #[test]
    fn bucket_series_iterates_contiguously() {
        let mut series = WeeklyBucketSeries::zero_filled(WeekSpan { first: 10, last: 13 });
        series.record(10);
        series.record(12);
        series.record(12);
        series.record(99);
        let pairs: Vec<_> = series.iter().collect();
        assert_eq!(pairs, vec![(10, 1), (11, 0), (12, 2), (13, 0)]);
        assert_eq!(series.total(), 3);
        assert!((series.mean_rate() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn mean_rate_is_exact_total_over_span() {
        let mut series = WeeklyBucketSeries::zero_filled(WeekSpan { first: 0, last: 2 });
        for _ in 0..7 {
            series.record(1);
        }
        assert_eq!(series.mean_rate(), 7.0 / 3.0);
        assert_eq!(series.mean_rate(), series.total() as f64 / series.len() as f64);

        let empty = WeeklyBucketSeries::zero_filled(WeekSpan { first: 5, last: 5 });
        assert_eq!(empty.mean_rate(), 0.0);
    }
}

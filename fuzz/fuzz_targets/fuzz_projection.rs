//! Fuzz target for the estimate → simulate → aggregate pipeline.
//!
//! Small weekly histories and parameters; checks the cumulative invariants on
//! every successful projection.

#![no_main]

use arbitrary::Arbitrary;
use bf_common::{EventRecord, IssueStatus};
use bf_core::build_projection_report;
use chrono::{Duration, TimeZone, Utc};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    weekly_open: Vec<u8>,
    weekly_closed: Vec<u8>,
    trials: u8,
    weeks: u8,
    current_open: u16,
    current_closed: u16,
    seed: u64,
}

fuzz_target!(|input: Input| {
    let Some(base) = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single() else {
        return;
    };
    let mut records = Vec::new();
    for (status, counts) in [
        (IssueStatus::Open, &input.weekly_open),
        (IssueStatus::Closed, &input.weekly_closed),
    ] {
        for (week, count) in counts.iter().take(26).enumerate() {
            let ts = base + Duration::weeks(week as i64);
            records.extend((0..*count % 16).map(|_| EventRecord::new(ts, status)));
        }
    }

    let result = build_projection_report(
        &records,
        u64::from(input.current_open),
        u64::from(input.current_closed),
        usize::from(input.trials % 64),
        usize::from(input.weeks % 16),
        Some(input.seed),
    );
    if let Ok(report) = result {
        for status in IssueStatus::ALL {
            let current = match status {
                IssueStatus::Open => f64::from(input.current_open),
                IssueStatus::Closed => f64::from(input.current_closed),
            };
            let series = report.series(status);
            assert!(series.satisfies_total_identity(current));
            assert!(series.weekly_expected.iter().all(|v| *v >= 0.0));
        }
    }
});

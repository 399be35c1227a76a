//! Fuzz target for record ingestion.
//!
//! Arbitrary bytes must either parse into records or return an error; parsed
//! records are pushed through rate estimation, which must not panic either.

#![no_main]

use bf_common::IssueStatus;
use bf_config::GroupBy;
use bf_core::estimate::estimate_weekly_rates;
use bf_core::ingest::parse_records;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(records) = parse_records(text) {
        for group_by in [GroupBy::Ungrouped, GroupBy::GroupKey] {
            if let Ok(estimate) = estimate_weekly_rates(&records, IssueStatus::Open, group_by) {
                assert!(estimate.total_rate() >= 0.0);
                assert!(estimate.total_rate().is_finite());
            }
        }
    }
});

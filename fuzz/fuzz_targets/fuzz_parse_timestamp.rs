//! Fuzz target for timestamp parsing.

#![no_main]

use bf_common::parse_timestamp;
use bf_core::estimate::{week_index, week_start};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Some(ts) = parse_timestamp(text) {
        // The week's Monday is never after the date itself. Near the edge of
        // the calendar it may not be representable.
        if let Some(monday) = week_start(week_index(&ts)) {
            assert!(monday <= ts.date_naive());
            assert!(ts.date_naive() - monday < chrono::Duration::days(7));
        }
    }
});

//! Monday-aligned calendar weeks.
//!
//! Week indices count whole weeks from the Monday 0001-01-01 of the
//! proleptic Gregorian calendar, so consecutive calendar weeks have
//! consecutive indices and ordering is plain integer ordering.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Index of the Monday-aligned week containing `ts` (UTC calendar date).
pub fn week_index(ts: &DateTime<Utc>) -> i64 {
    // num_days_from_ce() is 1 on 0001-01-01, a Monday.
    (i64::from(ts.date_naive().num_days_from_ce()) - 1).div_euclid(7)
}

/// Monday that starts week `index`, if it is representable.
pub fn week_start(index: i64) -> Option<NaiveDate> {
    let days = index.checked_mul(7)?.checked_add(1)?;
    NaiveDate::from_num_days_from_ce_opt(i32::try_from(days).ok()?)
}

/// Inclusive range of week indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WeekSpan {
    pub first: i64,
    pub last: i64,
}

impl WeekSpan {
    /// Smallest span covering every index, `None` for an empty iterator.
    pub fn covering(indices: impl IntoIterator<Item = i64>) -> Option<Self> {
        indices.into_iter().fold(None, |span, w| {
            Some(match span {
                None => WeekSpan { first: w, last: w },
                Some(s) => WeekSpan {
                    first: s.first.min(w),
                    last: s.last.max(w),
                },
            })
        })
    }

    /// Number of calendar weeks spanned, both ends included.
    pub fn len(&self) -> usize {
        (self.last - self.first + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.last < self.first
    }

    pub fn contains(&self, week: i64) -> bool {
        week >= self.first && week <= self.last
    }

    pub fn first_monday(&self) -> Option<NaiveDate> {
        week_start(self.first)
    }

    pub fn last_monday(&self) -> Option<NaiveDate> {
        week_start(self.last)
    }
}

//! Event record model.
//!
//! One [`EventRecord`] is one historical issue-lifecycle observation. Records
//! are immutable once ingested and are handed to the estimator by shared
//! reference.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of an issue observation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum IssueStatus {
    /// Issue was opened (and is still counted as open).
    Open,
    /// Issue was closed.
    Closed,
}

impl IssueStatus {
    /// Both statuses, in report order.
    pub const ALL: [IssueStatus; 2] = [IssueStatus::Open, IssueStatus::Closed];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Open => "OPEN",
            IssueStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(IssueStatus::Open),
            "CLOSED" => Ok(IssueStatus::Closed),
            other => Err(format!("unknown issue status: {other:?}")),
        }
    }
}

impl<'de> Deserialize<'de> for IssueStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One historical observation.
///
/// `timestamp` is required by contract but kept optional in the type so that
/// rows with an empty date column survive ingestion and are rejected by the
/// estimator with a precise record index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EventRecord {
    /// Creation timestamp of the issue.
    #[serde(
        default,
        alias = "issue_creation_date",
        deserialize_with = "deserialize_timestamp"
    )]
    #[schemars(with = "Option<DateTime<Utc>>")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Lifecycle status.
    pub status: IssueStatus,

    /// Grouping key (e.g. project id). `None` means ungrouped.
    #[serde(
        default,
        alias = "project",
        alias = "Projects - Project UUID__kee",
        skip_serializing_if = "Option::is_none"
    )]
    pub group_key: Option<String>,

    /// Author login, used only for upstream filtering.
    #[serde(default, alias = "author_login", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl EventRecord {
    pub fn new(timestamp: DateTime<Utc>, status: IssueStatus) -> Self {
        Self {
            timestamp: Some(timestamp),
            status,
            group_key: None,
            author: None,
        }
    }

    pub fn with_group_key(mut self, key: impl Into<String>) -> Self {
        self.group_key = Some(key.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// Current open/closed totals of a record set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StatusCounts {
    pub open: u64,
    pub closed: u64,
}

impl StatusCounts {
    pub fn from_records(records: &[EventRecord]) -> Self {
        records
            .iter()
            .fold(StatusCounts::default(), |mut acc, record| {
                match record.status {
                    IssueStatus::Open => acc.open += 1,
                    IssueStatus::Closed => acc.closed += 1,
                }
                acc
            })
    }

    pub fn get(&self, status: IssueStatus) -> u64 {
        match status {
            IssueStatus::Open => self.open,
            IssueStatus::Closed => self.closed,
        }
    }
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp in any of the layouts spreadsheet exports produce.
///
/// Accepts RFC 3339, `%z` offsets without a colon, naive date-times (read as
/// UTC) and bare dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp {s:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("open".parse::<IssueStatus>().unwrap(), IssueStatus::Open);
        assert_eq!(" Closed ".parse::<IssueStatus>().unwrap(), IssueStatus::Closed);
        assert!("reopened".parse::<IssueStatus>().is_err());
    }

    #[test]
    fn status_serializes_uppercase() {
        let json = serde_json::to_string(&IssueStatus::Closed).unwrap();
        assert_eq!(json, "\"CLOSED\"");
    }

    #[test]
    fn parse_timestamp_layouts() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-05T14:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T16:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T14:30:00+0000"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05 14:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T14:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05 14:30"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-05"),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-40"), None);
    }

    #[test]
    fn record_deserializes_source_column_names() {
        let json = r#"{
            "issue_creation_date": "2024-01-02 09:00:00",
            "status": "OPEN",
            "Projects - Project UUID__kee": "proj-a",
            "author_login": "dev1"
        }"#;
        let record: EventRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record.timestamp,
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap())
        );
        assert_eq!(record.status, IssueStatus::Open);
        assert_eq!(record.group_key.as_deref(), Some("proj-a"));
        assert_eq!(record.author.as_deref(), Some("dev1"));
    }

    #[test]
    fn record_missing_timestamp_is_none() {
        let record: EventRecord = serde_json::from_str(r#"{"status":"closed"}"#).unwrap();
        assert!(record.timestamp.is_none());

        let record: EventRecord =
            serde_json::from_str(r#"{"timestamp":"","status":"closed"}"#).unwrap();
        assert!(record.timestamp.is_none());
    }

    #[test]
    fn record_bad_timestamp_is_error() {
        let err = serde_json::from_str::<EventRecord>(r#"{"timestamp":"soon","status":"OPEN"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("unrecognized timestamp"));
    }

    #[test]
    fn status_counts_tally() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let records = vec![
            EventRecord::new(ts, IssueStatus::Open),
            EventRecord::new(ts, IssueStatus::Open),
            EventRecord::new(ts, IssueStatus::Closed),
        ];
        let counts = StatusCounts::from_records(&records);
        assert_eq!(counts, StatusCounts { open: 2, closed: 1 });
        assert_eq!(counts.get(IssueStatus::Closed), 1);
    }
}

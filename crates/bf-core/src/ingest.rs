//! Record ingestion and author filtering.
//!
//! Input is either a JSON array of records or JSON Lines (one record per
//! line); the layout is detected from the first non-whitespace byte. Field
//! names follow [`EventRecord`]'s serde aliases, so spreadsheet exports with
//! their original column names load as-is.

use std::collections::BTreeSet;
use std::io::{self, Read};
use std::path::Path;

use bf_common::EventRecord;
use thiserror::Error;
use tracing::debug;

use crate::error::ForecastError;

/// Ingestion errors.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    /// One record could not be decoded. `index` counts records, not lines.
    #[error("record {index}: {reason}")]
    Record { index: usize, reason: String },

    #[error("input is neither a JSON array nor JSON Lines: {0}")]
    Format(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;

impl From<IngestError> for bf_common::Error {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Read { source, .. } => bf_common::Error::Io(source),
            IngestError::Record { index, reason } => {
                bf_common::Error::InvalidRecord { index, reason }
            }
            IngestError::Format(msg) => bf_common::Error::Ingest(msg),
        }
    }
}

/// Read records from `path`, or from stdin when `path` is `None` or `-`.
pub fn read_records(path: Option<&Path>) -> Result<Vec<EventRecord>> {
    let (label, text) = match path {
        Some(p) if p.as_os_str() != "-" => {
            let text = std::fs::read_to_string(p).map_err(|source| IngestError::Read {
                path: p.display().to_string(),
                source,
            })?;
            (p.display().to_string(), text)
        }
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|source| IngestError::Read {
                    path: "<stdin>".to_string(),
                    source,
                })?;
            ("<stdin>".to_string(), text)
        }
    };

    let records = parse_records(&text)?;
    debug!(source = %label, records = records.len(), "records parsed");
    Ok(records)
}

/// Parse a JSON array or JSON Lines document.
///
/// Blank lines in JSON Lines input are skipped. Empty input yields no
/// records.
pub fn parse_records(text: &str) -> Result<Vec<EventRecord>> {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        parse_array(trimmed)
    } else {
        parse_lines(text)
    }
}

fn parse_array(text: &str) -> Result<Vec<EventRecord>> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(text).map_err(|e| IngestError::Format(e.to_string()))?;
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value).map_err(|e| IngestError::Record {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

fn parse_lines(text: &str) -> Result<Vec<EventRecord>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .enumerate()
        .map(|(index, (line_no, line))| {
            serde_json::from_str(line).map_err(|e| IngestError::Record {
                index,
                reason: format!("line {}: {e}", line_no + 1),
            })
        })
        .collect()
}

/// Author selection applied before estimation.
///
/// An empty selection keeps every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    authors: BTreeSet<String>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_authors<I, S>(authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            authors: authors.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }

    pub fn authors(&self) -> impl Iterator<Item = &str> {
        self.authors.iter().map(String::as_str)
    }

    pub fn matches(&self, record: &EventRecord) -> bool {
        self.authors.is_empty()
            || record
                .author
                .as_ref()
                .is_some_and(|author| self.authors.contains(author))
    }

    pub fn apply(&self, records: Vec<EventRecord>) -> SelectedRecords {
        let (origins, records) = records
            .into_iter()
            .enumerate()
            .filter(|(_, r)| self.matches(r))
            .unzip();
        SelectedRecords { records, origins }
    }
}

/// Records kept by a [`RecordFilter`], each with its position in the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectedRecords {
    records: Vec<EventRecord>,
    origins: Vec<usize>,
}

impl SelectedRecords {
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Input position of the `index`-th kept record.
    pub fn source_index(&self, index: usize) -> Option<usize> {
        self.origins.get(index).copied()
    }

    /// Point a record error raised over the selection at its input row.
    pub fn locate(&self, err: ForecastError) -> ForecastError {
        match err {
            ForecastError::InvalidRecord { index, reason } => ForecastError::InvalidRecord {
                index: self.source_index(index).unwrap_or(index),
                reason,
            },
            other => other,
        }
    }
}

/// Sorted, de-duplicated authors present in `records`.
pub fn distinct_authors(records: &[EventRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.author.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_common::IssueStatus;
    use std::io::Write;

    const ARRAY: &str = r#"[
        {"timestamp": "2024-01-01T10:00:00Z", "status": "OPEN", "author": "ana"},
        {"issue_creation_date": "2024-01-09 08:00:00", "status": "closed", "author_login": "bo"},
        {"timestamp": "2024-01-10", "status": "OPEN", "group_key": "p1"}
    ]"#;

    #[test]
    fn parses_json_array() {
        let records = parse_records(ARRAY).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].status, IssueStatus::Closed);
        assert_eq!(records[1].author.as_deref(), Some("bo"));
        assert_eq!(records[2].group_key.as_deref(), Some("p1"));
    }

    #[test]
    fn parses_json_lines_skipping_blanks() {
        let text = "{\"timestamp\":\"2024-01-01\",\"status\":\"OPEN\"}\n\n   \n{\"timestamp\":\"2024-01-08\",\"status\":\"CLOSED\"}\n";
        let records = parse_records(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].status, IssueStatus::Closed);
    }

    #[test]
    fn empty_input_has_no_records() {
        assert!(parse_records("").unwrap().is_empty());
        assert!(parse_records("  \n ").unwrap().is_empty());
        assert!(parse_records("[]").unwrap().is_empty());
    }

    #[test]
    fn bad_record_reports_record_index() {
        let text = "{\"timestamp\":\"2024-01-01\",\"status\":\"OPEN\"}\n\n{\"timestamp\":\"2024-01-08\",\"status\":\"REOPENED\"}\n";
        match parse_records(text).unwrap_err() {
            IngestError::Record { index, reason } => {
                assert_eq!(index, 1);
                assert!(reason.starts_with("line 3:"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let array = r#"[{"timestamp":"2024-01-01","status":"OPEN"},{"timestamp":"someday","status":"OPEN"}]"#;
        assert!(matches!(
            parse_records(array),
            Err(IngestError::Record { index: 1, .. })
        ));
    }

    #[test]
    fn truncated_array_is_format_error() {
        let err = parse_records(r#"[{"timestamp":"2024-01-01","status":"OPEN"}"#).unwrap_err();
        assert!(matches!(err, IngestError::Format(_)));
        let common: bf_common::Error = err.into();
        assert_eq!(common.code(), 22);
    }

    #[test]
    fn missing_timestamp_survives_ingestion() {
        let records = parse_records(r#"{"status":"OPEN"}"#).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].timestamp.is_none());
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(ARRAY.as_bytes()).unwrap();
        let records = read_records(Some(file.path())).unwrap();
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_records(Some(Path::new("/nonexistent/records.json"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/records.json"));
        let common: bf_common::Error = err.into();
        assert_eq!(common.code(), 60);
    }

    #[test]
    fn author_filter() {
        let records = parse_records(ARRAY).unwrap();

        let all = RecordFilter::new().apply(records.clone());
        assert_eq!(all.len(), 3);
        assert_eq!(all.records(), records.as_slice());

        let kept = RecordFilter::with_authors(["ana", "zed"]).apply(records.clone());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept.records()[0].author.as_deref(), Some("ana"));

        // Records without an author never match a non-empty selection.
        let filter = RecordFilter::with_authors(["bo"]);
        assert!(!filter.matches(&records[2]));
    }

    #[test]
    fn selection_keeps_input_positions() {
        let records = parse_records(ARRAY).unwrap();
        let kept = RecordFilter::with_authors(["bo"]).apply(records);
        assert_eq!(kept.source_index(0), Some(1));
        assert_eq!(kept.source_index(1), None);

        let err = kept.locate(ForecastError::InvalidRecord {
            index: 0,
            reason: "missing timestamp".to_string(),
        });
        assert!(matches!(err, ForecastError::InvalidRecord { index: 1, .. }));

        let other = kept.locate(ForecastError::InvalidParameter("x".to_string()));
        assert!(matches!(other, ForecastError::InvalidParameter(_)));
    }

    #[test]
    fn authors_are_sorted_and_unique() {
        let mut records = parse_records(ARRAY).unwrap();
        records.push(records[0].clone());
        assert_eq!(distinct_authors(&records), vec!["ana", "bo"]);
    }
}

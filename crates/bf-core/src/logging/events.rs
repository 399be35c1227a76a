//! Structured event vocabulary.
//!
//! Event names double as tracing targets, so a JSONL consumer can filter on
//! the `event` key alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Pipeline stage an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Reading and filtering records.
    Ingest,
    Estimate,
    Simulate,
    Aggregate,
    /// Report assembly and rendering.
    Report,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Ingest => "ingest",
            Stage::Estimate => "estimate",
            Stage::Simulate => "simulate",
            Stage::Aggregate => "aggregate",
            Stage::Report => "report",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Stage::Init,
            Stage::Ingest,
            Stage::Estimate,
            Stage::Simulate,
            Stage::Aggregate,
            Stage::Report,
        ]
        .into_iter()
        .find(|stage| stage.as_str() == s)
        .ok_or_else(|| format!("unknown stage: {s}"))
    }
}

/// Stable event names.
pub mod event_names {
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_ERROR: &str = "config.error";

    pub const INGEST_FINISHED: &str = "ingest.finished";

    pub const ESTIMATE_FINISHED: &str = "estimate.finished";

    pub const SIMULATE_SEEDED: &str = "simulate.seeded";
    pub const SIMULATE_FINISHED: &str = "simulate.finished";

    pub const AGGREGATE_FINISHED: &str = "aggregate.finished";

    pub const REPORT_FINISHED: &str = "report.finished";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// A structured log event, as written by the JSONL layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub ts: DateTime<Utc>,
    pub level: Level,
    /// Event name (the tracing target).
    pub event: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,

    /// Subcommand that produced the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl LogEvent {
    pub fn new(level: Level, event: impl Into<String>) -> Self {
        LogEvent {
            ts: Utc::now(),
            level,
            event: event.into(),
            run_id: None,
            stage: None,
            command: None,
            message: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(key.into(), v);
        }
        self
    }

    pub fn in_context(mut self, ctx: &LogContext, stage: Stage) -> Self {
        self.run_id = Some(ctx.run_id.clone());
        self.command.clone_from(&ctx.command);
        self.stage = Some(stage);
        self
    }

    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"error":"serialization_failed","event":"{}"}}"#,
                self.event
            )
        })
    }
}

/// Per-invocation correlation data, stamped on events by [`crate::log_event!`].
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
    pub command: Option<String>,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            command: None,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }
}

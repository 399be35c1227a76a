//! Structured logging for bf-core.
//!
//! stdout carries the command payload; every log line goes to stderr, either
//! human-readable or as JSONL (`BF_LOG_FORMAT=jsonl`).
//!
//! ```ignore
//! use bf_core::logging::{init_logging, LogConfig, LogContext, Stage, event_names};
//!
//! init_logging(&LogConfig::from_env(None, None));
//! let ctx = LogContext::new(generate_run_id()).with_command("forecast");
//! bf_core::log_event!(ctx, INFO, event_names::RUN_STARTED, Stage::Init, "starting");
//! ```

pub mod config;
pub mod events;
pub mod layer;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Level, LogContext, LogEvent, Stage};
pub use layer::JsonlLayer;

use std::io::IsTerminal;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(config.level).into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Human => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());
            if config.timestamps {
                registry.with(layer).try_init()
            } else {
                registry.with(layer.without_time()).try_init()
            }
        }
        LogFormat::Jsonl => registry.with(JsonlLayer::stderr()).try_init(),
    };
    // A subscriber installed by a test harness wins.
    let _ = result;
}

/// Short correlation id for one invocation.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("run-{}", &uuid[..12])
}

/// Emit a tracing event stamped with a [`LogContext`] and [`Stage`].
///
/// Inside an enabled span (the CLI's `run` span) the correlation fields come
/// from the span, so the event carries only its stage and payload.
///
/// ```ignore
/// log_event!(ctx, INFO, event_names::INGEST_FINISHED, Stage::Ingest, "records loaded",
///     records = 120);
/// ```
#[macro_export]
macro_rules! log_event {
    ($ctx:expr, $level:ident, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)* $(,)?) => {
        if tracing::Span::current().is_none() {
            tracing::event!(
                target: $event,
                tracing::Level::$level,
                run_id = %$ctx.run_id,
                command = $ctx.command.as_deref().unwrap_or_default(),
                stage = %$stage,
                message = $msg,
                $($key = $val,)*
            )
        } else {
            tracing::event!(
                target: $event,
                tracing::Level::$level,
                stage = %$stage,
                message = $msg,
                $($key = $val,)*
            )
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    #[test]
    fn run_ids_are_short_and_unique() {
        let a = generate_run_id();
        let b = generate_run_id();
        assert!(a.starts_with("run-"));
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
    }

    #[derive(Clone, Default)]
    struct Buf(Arc<Mutex<Vec<u8>>>);

    impl Write for Buf {
        fn write(&mut self, b: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(b)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Buf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn macro_stamps_context() {
        let buf = Buf::default();
        let subscriber = tracing_subscriber::registry().with(JsonlLayer::new(buf.clone()));
        let ctx = LogContext::new("run-test").with_command("rates");
        tracing::subscriber::with_default(subscriber, || {
            crate::log_event!(
                ctx,
                INFO,
                event_names::INGEST_FINISHED,
                Stage::Ingest,
                "records loaded",
                records = 3u64
            );
        });

        let line: serde_json::Value = serde_json::from_str(buf.contents().trim()).unwrap();
        assert_eq!(line["event"], "ingest.finished");
        assert_eq!(line["run_id"], "run-test");
        assert_eq!(line["stage"], "ingest");
        assert_eq!(line["fields"]["records"], 3);
    }

    #[test]
    fn run_span_supplies_correlation_once() {
        let human = Buf::default();
        let jsonl = Buf::default();
        let writer = human.clone();
        let subscriber = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(move || writer.clone())
                    .with_ansi(false)
                    .without_time(),
            )
            .with(JsonlLayer::new(jsonl.clone()));
        let ctx = LogContext::new("run-span").with_command("forecast");

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("run", run_id = %ctx.run_id, command = "forecast");
            span.in_scope(|| {
                crate::log_event!(
                    ctx,
                    INFO,
                    event_names::RUN_STARTED,
                    Stage::Init,
                    "starting forecast"
                );
            });
        });

        let text = human.contents();
        assert_eq!(text.matches("run_id").count(), 1, "{text}");
        assert_eq!(text.matches("command").count(), 1, "{text}");
        assert!(text.contains("starting forecast"));

        let line: serde_json::Value = serde_json::from_str(jsonl.contents().trim()).unwrap();
        assert_eq!(line["run_id"], "run-span");
        assert_eq!(line["command"], "forecast");
    }
}

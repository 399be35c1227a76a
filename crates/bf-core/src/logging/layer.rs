//! JSONL tracing layer.
//!
//! Writes one [`LogEvent`] per line. `run_id`, `command` and `stage` are taken
//! from the event itself or, failing that, from the innermost enclosing span
//! that recorded them.

use std::io::{self, Write};
use std::sync::Mutex;

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::events::{LogEvent, Stage};

/// Correlation fields carried by spans and events.
#[derive(Debug, Clone, Default, PartialEq)]
struct Correlation {
    run_id: Option<String>,
    command: Option<String>,
    stage: Option<Stage>,
}

impl Correlation {
    /// Take a correlation field, returning false for ordinary fields.
    fn absorb(&mut self, name: &str, value: String) -> bool {
        if value.is_empty() {
            return matches!(name, "run_id" | "command" | "stage");
        }
        match name {
            "run_id" => self.run_id = Some(value),
            "command" => self.command = Some(value),
            "stage" => self.stage = value.parse().ok(),
            _ => return false,
        }
        true
    }

    fn fill_from(&mut self, outer: &Correlation) {
        if self.run_id.is_none() {
            self.run_id.clone_from(&outer.run_id);
        }
        if self.command.is_none() {
            self.command.clone_from(&outer.command);
        }
        if self.stage.is_none() {
            self.stage = outer.stage;
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    correlation: Correlation,
    message: Option<String>,
    fields: std::collections::BTreeMap<String, serde_json::Value>,
}

impl EventVisitor {
    fn put(&mut self, field: &Field, value: serde_json::Value) {
        self.fields.insert(field.name().to_string(), value);
    }

    fn put_text(&mut self, field: &Field, text: String) {
        if field.name() == "message" {
            self.message = Some(text);
        } else if !self.correlation.absorb(field.name(), text.clone()) {
            self.put(field, serde_json::Value::String(text));
        }
    }
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put_text(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put_text(field, format!("{value:?}"));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.into());
    }

    fn record_u128(&mut self, field: &Field, value: u128) {
        // JSON numbers beyond u64 lose precision downstream.
        self.put(field, serde_json::Value::String(value.to_string()));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if let Some(n) = serde_json::Number::from_f64(value) {
            self.put(field, serde_json::Value::Number(n));
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value.into());
    }
}

/// Tracing layer emitting JSONL, stderr by default.
pub struct JsonlLayer<W = io::Stderr> {
    writer: Mutex<W>,
}

impl JsonlLayer<io::Stderr> {
    pub fn stderr() -> Self {
        JsonlLayer::new(io::stderr())
    }
}

impl<W: Write> JsonlLayer<W> {
    pub fn new(writer: W) -> Self {
        JsonlLayer {
            writer: Mutex::new(writer),
        }
    }
}

impl<S, W> Layer<S> for JsonlLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: Write + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = EventVisitor::default();
        attrs.record(&mut visitor);
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(visitor.correlation);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let mut correlation = visitor.correlation;
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope {
                if let Some(outer) = span.extensions().get::<Correlation>() {
                    correlation.fill_from(outer);
                }
            }
        }

        let record = LogEvent {
            run_id: correlation.run_id,
            command: correlation.command,
            stage: correlation.stage,
            message: visitor.message,
            fields: visitor.fields,
            ..LogEvent::new((*event.metadata().level()).into(), event.metadata().target())
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", record.to_jsonl());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn lines(&self) -> Vec<serde_json::Value> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }
    }

    fn capture(f: impl FnOnce()) -> Vec<serde_json::Value> {
        let buf = SharedBuf::default();
        let subscriber = tracing_subscriber::registry().with(JsonlLayer::new(buf.clone()));
        tracing::subscriber::with_default(subscriber, f);
        buf.lines()
    }

    #[test]
    fn event_becomes_one_json_line() {
        let lines = capture(|| {
            tracing::info!(target: "simulate.finished", trials = 1000u64, seed = 7u64, "done");
        });
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line["event"], "simulate.finished");
        assert_eq!(line["level"], "info");
        assert_eq!(line["message"], "done");
        assert_eq!(line["fields"]["trials"], 1000);
        assert!(line["ts"].is_string());
    }

    #[test]
    fn correlation_comes_from_spans() {
        let lines = capture(|| {
            let span = tracing::info_span!("run", run_id = "run-1", command = "forecast");
            let _guard = span.enter();
            tracing::warn!(target: "estimate.finished", stage = "estimate", "careful");
        });
        let line = &lines[0];
        assert_eq!(line["run_id"], "run-1");
        assert_eq!(line["command"], "forecast");
        assert_eq!(line["stage"], "estimate");
        assert_eq!(line["level"], "warn");
        assert!(line.get("fields").is_none());
    }

    #[test]
    fn event_fields_override_span_fields() {
        let lines = capture(|| {
            let span = tracing::info_span!("run", run_id = "outer");
            let _guard = span.enter();
            tracing::error!(target: "internal_error", run_id = "inner", "x");
        });
        assert_eq!(lines[0]["run_id"], "inner");
    }

    #[test]
    fn large_counts_are_strings() {
        let lines = capture(|| {
            tracing::error!(target: "t", requested = 5u128, "budget");
        });
        assert_eq!(lines[0]["fields"]["requested"], "5");
    }
}

//! Trace event sinks.

use super::config::SinkFormat;
use super::correlation::{render_prefix, Glyph};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// The kind of span boundary an event marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A span began.
    Begin,
    /// A span completed normally.
    Complete,
    /// A span completed with an error.
    Error,
}

/// A structured trace event, one per span boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Wall-clock time the event was emitted.
    pub timestamp: DateTime<Utc>,

    /// The correlation id token.
    pub id: String,

    /// Nesting level of the span.
    pub level: u32,

    /// Which span boundary this event marks.
    pub kind: EventKind,

    /// The operation label.
    pub label: String,

    /// Elapsed milliseconds; present on completion events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,

    /// Error description; present on error events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TraceEvent {
    /// Renders the event as an indented log line.
    ///
    /// Line shapes, by kind:
    ///
    /// ```text
    /// [id] <indent>-->label
    /// [id] <indent><--label time=12ms
    /// [id] <indent><X-label time=12ms ex=description
    /// ```
    pub fn render(&self) -> String {
        match self.kind {
            EventKind::Begin => {
                format!(
                    "[{}] {}{}",
                    self.id,
                    render_prefix(self.level, Glyph::Start),
                    self.label
                )
            }
            EventKind::Complete => {
                format!(
                    "[{}] {}{} time={}ms",
                    self.id,
                    render_prefix(self.level, Glyph::Complete),
                    self.label,
                    self.elapsed_ms.unwrap_or(0)
                )
            }
            EventKind::Error => {
                format!(
                    "[{}] {}{} time={}ms ex={}",
                    self.id,
                    render_prefix(self.level, Glyph::Exception),
                    self.label,
                    self.elapsed_ms.unwrap_or(0),
                    self.error.as_deref().unwrap_or("")
                )
            }
        }
    }
}

/// Destination for trace events.
pub trait TraceSink: Send + Sync {
    /// Emit a single event.
    fn emit(&self, event: &TraceEvent);
}

/// Sink that forwards events to the `tracing` log facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink {
    format: SinkFormat,
}

impl LogSink {
    /// Create a log sink with the given output format.
    pub fn new(format: SinkFormat) -> Self {
        Self { format }
    }
}

impl TraceSink for LogSink {
    fn emit(&self, event: &TraceEvent) {
        match self.format {
            SinkFormat::Text => {
                tracing::info!(target: "calltrace", "{}", event.render());
            }
            SinkFormat::Json => match serde_json::to_string(event) {
                Ok(json) => tracing::info!(target: "calltrace", "{}", json),
                Err(e) => {
                    tracing::error!(target: "calltrace", error = %e, "failed to serialize trace event");
                }
            },
        }
    }
}

/// Sink that stores events in memory, for assertions in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<TraceEvent>>,
}

impl MemorySink {
    /// Create an empty memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured events, in emission order.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// All captured events rendered as log lines.
    pub fn lines(&self) -> Vec<String> {
        self.events
            .lock()
            .map(|e| e.iter().map(TraceEvent::render).collect())
            .unwrap_or_default()
    }

    /// Discard all captured events.
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    /// Number of captured events.
    pub fn count(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }
}

impl TraceSink for MemorySink {
    fn emit(&self, event: &TraceEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Sink that fans events out to multiple inner sinks.
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Arc<dyn TraceSink>>,
}

impl MultiSink {
    /// Create an empty fan-out sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an inner sink.
    pub fn add(&mut self, sink: Arc<dyn TraceSink>) {
        self.sinks.push(sink);
    }
}

impl TraceSink for MultiSink {
    fn emit(&self, event: &TraceEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}

//! The tracer: the public span API.

use super::config::TraceConfig;
use super::context::{ThreadLocalContext, TraceContext};
use super::correlation::CorrelationId;
use super::record::CallRecord;
use super::sink::{EventKind, LogSink, TraceEvent, TraceSink};
use chrono::Utc;
use std::sync::Arc;

/// Emits one trace event per span boundary and drives the context
/// lifecycle.
///
/// A tracer is cheap to clone and safe to share across threads; span
/// nesting is tracked per execution thread by its [`TraceContext`]
/// strategy.
///
/// ```
/// use calltrace::trace::Tracer;
///
/// let tracer = Tracer::new();
/// let record = tracer.begin("OrderService.process()");
/// // ... do the work ...
/// tracer.end(record);
/// ```
#[derive(Clone)]
pub struct Tracer {
    context: Arc<dyn TraceContext>,
    sink: Arc<dyn TraceSink>,
    config: TraceConfig,
}

impl Tracer {
    /// Create a tracer with the default strategy: per-thread context and
    /// the `tracing` log sink.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a tracer builder.
    #[must_use]
    pub fn builder() -> TracerBuilder {
        TracerBuilder::new()
    }

    /// The correlation id currently active on the calling thread, if any.
    ///
    /// Read this on one thread and hand it to another to continue the
    /// trace there via [`begin_with_id`](Self::begin_with_id).
    pub fn current(&self) -> Option<CorrelationId> {
        self.context.current()
    }

    /// Begin a span, stepping the calling thread's context one level in.
    ///
    /// Creates a fresh root-level correlation id when the thread has no
    /// active context. The returned record must be consumed by exactly one
    /// [`end`](Self::end) or [`fail`](Self::fail).
    pub fn begin(&self, label: impl Into<String>) -> CallRecord {
        let id = self.context.sync_or_create();
        self.start(id, label.into())
    }

    /// Begin a span under a correlation id obtained from another thread.
    ///
    /// Attaches `id.next()` to the calling thread's context, so the span
    /// renders one level below the originating span. This is the only
    /// cross-thread propagation path; there is no ambient inheritance.
    pub fn begin_with_id(&self, id: CorrelationId, label: impl Into<String>) -> CallRecord {
        let attached = id.next();
        self.context.attach(attached);
        self.start(attached, label.into())
    }

    /// Complete a span normally.
    pub fn end(&self, record: CallRecord) {
        self.complete(record, None);
    }

    /// Complete a span with an error.
    ///
    /// The error is logged and the span released; the caller still owns
    /// the error and re-raises it unchanged.
    pub fn fail(&self, record: CallRecord, error: &dyn std::error::Error) {
        self.complete(record, Some(error.to_string()));
    }

    /// Run a closure inside a begin/end pair, failing the span when the
    /// closure errors.
    ///
    /// The closure's result is returned unchanged in both cases.
    pub fn execute<R, E>(
        &self,
        label: impl Into<String>,
        f: impl FnOnce() -> Result<R, E>,
    ) -> Result<R, E>
    where
        E: std::fmt::Display,
    {
        let record = self.begin(label);
        match f() {
            Ok(value) => {
                self.end(record);
                Ok(value)
            }
            Err(error) => {
                self.complete(record, Some(error.to_string()));
                Err(error)
            }
        }
    }

    fn start(&self, id: CorrelationId, label: String) -> CallRecord {
        let record = CallRecord::new(id, label);
        self.emit(TraceEvent {
            timestamp: record.started_at(),
            id: id.to_string(),
            level: id.level(),
            kind: EventKind::Begin,
            label: record.label().to_string(),
            elapsed_ms: None,
            error: None,
        });
        record
    }

    fn complete(&self, record: CallRecord, error: Option<String>) {
        let elapsed_ms = record.elapsed_ms();
        let id = record.correlation();
        let kind = if error.is_some() {
            EventKind::Error
        } else {
            EventKind::Complete
        };
        self.emit(TraceEvent {
            timestamp: Utc::now(),
            id: id.to_string(),
            level: id.level(),
            kind,
            label: record.into_label(),
            elapsed_ms: Some(elapsed_ms),
            error,
        });
        self.context.release();
    }

    fn emit(&self, event: TraceEvent) {
        if self.config.enabled {
            self.sink.emit(&event);
        }
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Tracer`].
pub struct TracerBuilder {
    context: Option<Arc<dyn TraceContext>>,
    sink: Option<Arc<dyn TraceSink>>,
    config: TraceConfig,
}

impl TracerBuilder {
    fn new() -> Self {
        Self {
            context: None,
            sink: None,
            config: TraceConfig::default(),
        }
    }

    /// Use the given context strategy instead of the per-thread default.
    #[must_use]
    pub fn context(mut self, context: Arc<dyn TraceContext>) -> Self {
        self.context = Some(context);
        self
    }

    /// Use the given sink instead of the `tracing` log sink.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Use the given configuration.
    #[must_use]
    pub fn config(mut self, config: TraceConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the tracer.
    pub fn build(self) -> Tracer {
        let format = self.config.format;
        Tracer {
            context: self
                .context
                .unwrap_or_else(|| Arc::new(ThreadLocalContext::new())),
            sink: self.sink.unwrap_or_else(|| Arc::new(LogSink::new(format))),
            config: self.config,
        }
    }
}

//! # Trace Engine
//!
//! Correlation identifiers with call-depth tracking, propagated
//! automatically within one thread of execution and explicitly when
//! crossing into another thread.
//!
//! ## Features
//!
//! - Correlation id with stable token and stepped nesting level
//! - Per-thread context lifecycle (create, attach, release)
//! - Begin/end/fail span API with elapsed-time reporting
//! - Indented log line rendering with start/stop/exception glyphs
//! - Pluggable sinks: `tracing` facade, in-memory capture, fan-out

pub mod config;
pub mod context;
pub mod correlation;
pub mod error;
pub mod record;
pub mod sink;
pub mod tracer;

pub use config::{SinkFormat, TraceConfig};
pub use context::{SharedContext, ThreadLocalContext, TraceContext};
pub use correlation::{CorrelationId, Glyph};
pub use error::{TraceError, TraceResult};
pub use record::CallRecord;
pub use sink::{EventKind, LogSink, MemorySink, MultiSink, TraceEvent, TraceSink};
pub use tracer::{Tracer, TracerBuilder};

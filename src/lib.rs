//! # calltrace
//!
//! An in-process call tracing and method interception toolkit.
//!
//! ## Features
//!
//! - Correlation identifiers with visual nesting depth
//! - Per-thread trace context with explicit cross-thread handoff
//! - Structured trace events with pluggable sinks (log, memory, fan-out)
//! - Interceptor chains composed over arbitrary targets
//! - Name-filtered advisors with registration-order semantics
//! - Bounded retry and timing interceptors
//!
//! ## Architecture
//!
//! The crate has two halves. The [`trace`] module is the trace-context
//! engine: a [`trace::Tracer`] steps a per-thread [`trace::CorrelationId`]
//! in and out of nesting levels and emits one event per span boundary.
//! The [`intercept`] module composes cross-cutting behaviors around target
//! calls through a [`intercept::ProxyChain`]; its
//! [`intercept::TraceInterceptor`] is the bridge that invokes the tracer
//! around intercepted methods.
//!
//! Cross-thread propagation is always explicit: read a `CorrelationId` on
//! one thread, pass it as a value, and call
//! [`trace::Tracer::begin_with_id`] on the other.

pub mod intercept;
pub mod trace;

pub use intercept::{Advisor, Interceptor, NameFilter, ProxyChain};
pub use trace::{CorrelationId, Tracer};

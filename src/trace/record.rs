//! In-flight span records.

use super::correlation::CorrelationId;
use chrono::{DateTime, Utc};
use std::time::Instant;

/// A started-but-not-yet-finished unit of tracing.
///
/// Created by [`Tracer::begin`](super::Tracer::begin) and consumed, by
/// value, by exactly one matching [`end`](super::Tracer::end) or
/// [`fail`](super::Tracer::fail).
#[derive(Debug)]
pub struct CallRecord {
    correlation: CorrelationId,
    started: Instant,
    started_at: DateTime<Utc>,
    label: String,
}

impl CallRecord {
    pub(crate) fn new(correlation: CorrelationId, label: String) -> Self {
        Self {
            correlation,
            started: Instant::now(),
            started_at: Utc::now(),
            label,
        }
    }

    /// The correlation id snapshot active when this span began.
    pub fn correlation(&self) -> CorrelationId {
        self.correlation
    }

    /// Wall-clock time at which this span began.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// The operation label this span was begun with.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Milliseconds elapsed since the span began.
    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    pub(crate) fn into_label(self) -> String {
        self.label
    }
}

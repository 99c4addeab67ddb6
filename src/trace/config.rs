//! Tracer configuration.

use serde::{Deserialize, Serialize};

/// Output format for the log sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkFormat {
    /// Human-readable indented line.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Tracer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Whether trace events are emitted.
    ///
    /// When disabled, context stepping still runs so nesting depth stays
    /// consistent if tracing is re-enabled mid-flight.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Output format for the log sink.
    #[serde(default)]
    pub format: SinkFormat,
}

fn default_enabled() -> bool {
    true
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            format: SinkFormat::default(),
        }
    }
}

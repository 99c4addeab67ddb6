//! Trace engine error types.

use thiserror::Error;

/// Errors that can occur in the trace engine.
#[derive(Debug, Error)]
pub enum TraceError {
    /// A correlation id at the root level was asked to step out.
    #[error("correlation id {id} is already at root level")]
    BelowRoot {
        /// The rendered id token.
        id: String,
    },
}

/// Result type for trace operations.
pub type TraceResult<T> = Result<T, TraceError>;

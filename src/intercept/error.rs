//! Interception error types.

use thiserror::Error;

/// Type-erased error carried through an interceptor chain.
///
/// Target errors pass through the chain unchanged inside this box, so a
/// caller can downcast to the concrete type it would have seen without
/// any interceptor attached.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by the interception layer itself.
#[derive(Debug, Error)]
pub enum InterceptError {
    /// Every configured attempt failed; wraps the last observed failure.
    #[error("retry exhausted after {attempts} attempts: {source}")]
    RetryExhausted {
        /// The configured attempt bound.
        attempts: u32,
        /// The failure from the final attempt.
        #[source]
        source: BoxError,
    },

    /// A retry bound of zero was configured.
    #[error("retry bound must be at least 1, got {0}")]
    InvalidAttempts(u32),

    /// An interceptor substituted a value of the wrong type.
    #[error("interceptor returned an unexpected value type for {method}")]
    UnexpectedReturn {
        /// Label of the invoked method.
        method: String,
    },
}

/// Result type for interception operations.
pub type InterceptResult<T> = Result<T, InterceptError>;

//! Bounded retry interceptor.

use super::error::{BoxError, InterceptError, InterceptResult};
use super::interceptor::Interceptor;
use super::invocation::{ErasedResult, Invocation};
use serde::{Deserialize, Serialize};

/// Retry policy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first. Must be at least 1.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_max_attempts() -> u32 {
    3
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

impl RetryConfig {
    /// Checks the configured bound is usable.
    pub fn validate(&self) -> InterceptResult<()> {
        if self.max_attempts == 0 {
            return Err(InterceptError::InvalidAttempts(0));
        }
        Ok(())
    }
}

/// An interceptor that re-runs the rest of the chain up to a fixed number
/// of attempts.
///
/// Intermediate failures are suppressed; after the final attempt fails,
/// the last failure is surfaced wrapped in
/// [`InterceptError::RetryExhausted`]. The bound is explicit and finite;
/// unbounded retry is not constructible.
#[derive(Debug, Clone, Copy)]
pub struct RetryInterceptor {
    max_attempts: u32,
}

impl RetryInterceptor {
    /// Create a retry interceptor with the given attempt bound (`>= 1`).
    pub fn new(max_attempts: u32) -> InterceptResult<Self> {
        if max_attempts == 0 {
            return Err(InterceptError::InvalidAttempts(0));
        }
        Ok(Self { max_attempts })
    }

    /// Create a retry interceptor from a validated config.
    pub fn from_config(config: &RetryConfig) -> InterceptResult<Self> {
        config.validate()?;
        Self::new(config.max_attempts)
    }

    /// The configured attempt bound.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Interceptor for RetryInterceptor {
    fn intercept(&self, invocation: &mut dyn Invocation) -> ErasedResult {
        let mut last_failure: Option<BoxError> = None;
        for attempt in 1..=self.max_attempts {
            tracing::debug!(
                target: "calltrace",
                method = %invocation.method(),
                attempt,
                max_attempts = self.max_attempts,
                "retry attempt"
            );
            match invocation.proceed() {
                Ok(value) => return Ok(value),
                Err(failure) => last_failure = Some(failure),
            }
        }
        // max_attempts >= 1, so at least one failure was recorded.
        let source = last_failure.unwrap_or_else(|| "target was never attempted".into());
        Err(InterceptError::RetryExhausted {
            attempts: self.max_attempts,
            source,
        }
        .into())
    }
}

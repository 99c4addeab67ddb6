//! The interceptor trait and the basic advices.

use super::invocation::{ErasedResult, Invocation};
use std::time::Instant;

/// A single cross-cutting behavior invoked around a target call.
///
/// Implementations must be stateless or independently thread-safe; one
/// interceptor instance serves every invocation of the chains it is
/// registered on, concurrently.
pub trait Interceptor: Send + Sync {
    /// Invoke the behavior around `invocation.proceed()`.
    fn intercept(&self, invocation: &mut dyn Invocation) -> ErasedResult;
}

/// An interceptor that calls straight through to the rest of the chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughInterceptor;

impl PassthroughInterceptor {
    /// Create a passthrough interceptor.
    pub fn new() -> Self {
        Self
    }
}

impl Interceptor for PassthroughInterceptor {
    fn intercept(&self, invocation: &mut dyn Invocation) -> ErasedResult {
        invocation.proceed()
    }
}

/// An interceptor that logs the elapsed time of the wrapped call.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimingInterceptor;

impl TimingInterceptor {
    /// Create a timing interceptor.
    pub fn new() -> Self {
        Self
    }
}

impl Interceptor for TimingInterceptor {
    fn intercept(&self, invocation: &mut dyn Invocation) -> ErasedResult {
        let started = Instant::now();
        let result = invocation.proceed();
        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            target: "calltrace",
            method = %invocation.method(),
            elapsed_ms,
            ok = result.is_ok(),
            "timed call"
        );
        result
    }
}

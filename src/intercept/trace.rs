//! Tracing interceptor: bridges chains into the trace engine.

use super::interceptor::Interceptor;
use super::invocation::{ErasedResult, Invocation};
use crate::trace::Tracer;

/// An interceptor that opens a span around the wrapped call.
///
/// Begins a span labeled with the invoked method (for example
/// `OrderRepository.save()`), ends it on success and fails it on error,
/// then re-raises the error unchanged. Selective suppression is the
/// advisor's job: pair this interceptor with a [`NameFilter`] that does
/// not match the methods to keep out of the trace, and those calls bypass
/// the tracer entirely.
///
/// [`NameFilter`]: super::NameFilter
pub struct TraceInterceptor {
    tracer: Tracer,
}

impl TraceInterceptor {
    /// Create a tracing interceptor emitting through the given tracer.
    pub fn new(tracer: Tracer) -> Self {
        Self { tracer }
    }
}

impl Interceptor for TraceInterceptor {
    fn intercept(&self, invocation: &mut dyn Invocation) -> ErasedResult {
        let record = self.tracer.begin(invocation.method().label());
        match invocation.proceed() {
            Ok(value) => {
                self.tracer.end(record);
                Ok(value)
            }
            Err(error) => {
                self.tracer.fail(record, error.as_ref());
                Err(error)
            }
        }
    }
}

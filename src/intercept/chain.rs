//! Proxy chains: ordered advisor composition over a target.

use super::advisor::Advisor;
use super::error::InterceptError;
use super::invocation::{CallResult, ErasedResult, ErasedValue, Invocation, MethodRef};

/// A target wrapped by an ordered, frozen list of advisors.
///
/// On [`invoke`](Self::invoke), advisors whose filter matches the method
/// name run in registration order on the way in and reverse order on the
/// way out; the first-registered advisor is outermost. Advisors whose
/// filter does not match are skipped entirely. The innermost step is the
/// real target call.
///
/// The advisor list is frozen at build time, so a chain can be invoked
/// concurrently from any number of threads as long as its interceptors
/// are themselves thread-safe.
pub struct ProxyChain<T> {
    target: T,
    advisors: Vec<Advisor>,
}

impl<T> ProxyChain<T> {
    /// Start building a chain around a target.
    #[must_use]
    pub fn builder(target: T) -> ProxyChainBuilder<T> {
        ProxyChainBuilder::new(target)
    }

    /// The wrapped target.
    pub fn target(&self) -> &T {
        &self.target
    }

    /// The advisors, in registration order.
    pub fn advisors(&self) -> &[Advisor] {
        &self.advisors
    }

    /// Invoke `call` on the target through the interceptor chain.
    ///
    /// `method` gives the identity that filters match against and tracers
    /// label with; `call` performs the real operation. The call's result
    /// or error propagates back out unchanged unless an interceptor
    /// intentionally replaces it (retry wraps the final failure).
    pub fn invoke<R, F>(&self, method: MethodRef<'_>, call: F) -> CallResult<R>
    where
        R: Send + 'static,
        F: Fn(&T) -> CallResult<R>,
    {
        let erased_call = |target: &T| -> ErasedResult {
            call(target).map(|value| Box::new(value) as ErasedValue)
        };
        let mut invocation = ChainInvocation {
            method,
            advisors: &self.advisors,
            cursor: 0,
            target: &self.target,
            call: &erased_call,
        };
        let value = invocation.proceed()?;
        match value.downcast::<R>() {
            Ok(boxed) => Ok(*boxed),
            Err(_) => Err(InterceptError::UnexpectedReturn {
                method: method.label(),
            }
            .into()),
        }
    }
}

/// Builder for [`ProxyChain`].
pub struct ProxyChainBuilder<T> {
    target: T,
    advisors: Vec<Advisor>,
}

impl<T> ProxyChainBuilder<T> {
    fn new(target: T) -> Self {
        Self {
            target,
            advisors: Vec::new(),
        }
    }

    /// Register an advisor; earlier registrations sit outermost.
    #[must_use]
    pub fn advisor(mut self, advisor: Advisor) -> Self {
        self.advisors.push(advisor);
        self
    }

    /// Freeze the advisor list and build the chain.
    pub fn build(self) -> ProxyChain<T> {
        ProxyChain {
            target: self.target,
            advisors: self.advisors,
        }
    }
}

/// Cursor-based walk over the matching advisors of one call.
struct ChainInvocation<'a, T> {
    method: MethodRef<'a>,
    advisors: &'a [Advisor],
    cursor: usize,
    target: &'a T,
    call: &'a dyn Fn(&T) -> ErasedResult,
}

impl<T> ChainInvocation<'_, T> {
    fn proceed_from_cursor(&mut self) -> ErasedResult {
        let advisors = self.advisors;
        while self.cursor < advisors.len() {
            let advisor = &advisors[self.cursor];
            self.cursor += 1;
            if advisor.applies_to(self.method.method()) {
                return advisor.interceptor().intercept(self);
            }
        }
        (self.call)(self.target)
    }
}

impl<T> Invocation for ChainInvocation<'_, T> {
    fn method(&self) -> MethodRef<'_> {
        self.method
    }

    // The cursor is restored after each run so that an interceptor calling
    // proceed more than once re-runs the same remaining chain.
    fn proceed(&mut self) -> ErasedResult {
        let saved = self.cursor;
        let result = self.proceed_from_cursor();
        self.cursor = saved;
        result
    }
}

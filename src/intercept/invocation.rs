//! The invocation seam between interceptors and the target call.

use super::error::BoxError;
use std::any::Any;
use std::fmt;

/// Type-erased return value carried through a chain.
pub type ErasedValue = Box<dyn Any + Send>;

/// Result of a target call or chain step.
pub type CallResult<T> = Result<T, BoxError>;

/// Result type flowing through interceptors.
pub type ErasedResult = CallResult<ErasedValue>;

/// Identity of the method being invoked: the declaring type's simple name
/// plus the method name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodRef<'a> {
    type_name: &'a str,
    method: &'a str,
}

impl<'a> MethodRef<'a> {
    /// Create a method reference.
    pub fn new(type_name: &'a str, method: &'a str) -> Self {
        Self { type_name, method }
    }

    /// The declaring type's simple name.
    pub fn type_name(&self) -> &'a str {
        self.type_name
    }

    /// The method name; this is what name filters match against.
    pub fn method(&self) -> &'a str {
        self.method
    }

    /// The trace label, e.g. `OrderRepository.save()`.
    pub fn label(&self) -> String {
        format!("{}.{}()", self.type_name, self.method)
    }
}

impl fmt::Display for MethodRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}()", self.type_name, self.method)
    }
}

/// One in-flight intercepted call.
///
/// Handed to each [`Interceptor`](super::Interceptor) in turn;
/// [`proceed`](Self::proceed) runs the rest of the chain and finally the
/// real target.
pub trait Invocation {
    /// The method being invoked.
    fn method(&self) -> MethodRef<'_>;

    /// Run the remaining interceptors and the target call.
    ///
    /// Re-entrant: an interceptor may call this several times (retry) and
    /// each call runs the same remaining chain. Not calling it at all
    /// short-circuits the target and every inner interceptor.
    fn proceed(&mut self) -> ErasedResult;
}

//! Advisors: a name filter paired with an interceptor.

use super::filter::NameFilter;
use super::interceptor::Interceptor;
use std::sync::Arc;

/// One (filter, interceptor) pairing in a chain.
///
/// Immutable once the owning [`ProxyChain`](super::ProxyChain) is built;
/// its position in the chain's advisor list is its registration order.
#[derive(Clone)]
pub struct Advisor {
    filter: NameFilter,
    interceptor: Arc<dyn Interceptor>,
}

impl Advisor {
    /// Pair a filter with an interceptor.
    pub fn new(filter: NameFilter, interceptor: Arc<dyn Interceptor>) -> Self {
        Self {
            filter,
            interceptor,
        }
    }

    /// Pair an interceptor with a filter that matches every method.
    pub fn always(interceptor: Arc<dyn Interceptor>) -> Self {
        Self::new(NameFilter::match_all(), interceptor)
    }

    /// The advisor's name filter.
    pub fn filter(&self) -> &NameFilter {
        &self.filter
    }

    /// The advisor's interceptor.
    pub fn interceptor(&self) -> &Arc<dyn Interceptor> {
        &self.interceptor
    }

    /// Whether this advisor applies to the given method name.
    pub fn applies_to(&self, method: &str) -> bool {
        self.filter.matches(method)
    }
}

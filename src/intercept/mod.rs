//! # Interception Layer
//!
//! Proxy objects that wrap a target, intercept calls by name, and chain
//! independent cross-cutting behaviors around a single invocation.
//!
//! ## Features
//!
//! - Interceptor trait with a re-entrant `proceed()` seam
//! - Wildcard name filters (`save*`, `*est`, `*quest*`)
//! - Advisors pairing a filter with one interceptor
//! - Proxy chains with registration-order (outermost-first) semantics
//! - Bounded retry, timing, and tracing interceptors

pub mod advisor;
pub mod chain;
pub mod error;
pub mod filter;
pub mod interceptor;
pub mod invocation;
pub mod retry;
pub mod trace;

pub use advisor::Advisor;
pub use chain::{ProxyChain, ProxyChainBuilder};
pub use error::{BoxError, InterceptError, InterceptResult};
pub use filter::NameFilter;
pub use interceptor::{Interceptor, PassthroughInterceptor, TimingInterceptor};
pub use invocation::{CallResult, ErasedResult, ErasedValue, Invocation, MethodRef};
pub use retry::{RetryConfig, RetryInterceptor};
pub use trace::TraceInterceptor;

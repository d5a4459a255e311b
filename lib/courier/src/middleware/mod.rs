//! Request/response middleware.
//!
//! A [`Middleware`] receives the outgoing [`Request`] and a [`Next`]
//! continuation. It may rewrite the request before calling `next`, rewrite
//! the response afterwards, answer without calling `next` at all, or fail.
//!
//! Middleware is composed into a [`MiddlewareChain`]: the first registered
//! middleware is the outermost one, so it sees the request first and the
//! response last.
//!
//! # Available Middleware
//!
//! - [`BearerAuth`] - Adds `Authorization: Bearer <token>` header
//! - [`BasicAuth`] - Adds `Authorization: Basic <base64>` header
//! - [`Logging`] - Logs requests/responses using `tracing`
//! - [`Metrics`] - Records request counts, durations and in-flight requests via `metrics`
//! - [`from_fn`] - Adapts a closure
//!
//! # Example
//!
//! ```ignore
//! use courier::middleware::{self, Next};
//! use courier::{Client, Request};
//!
//! let client = Client::builder()
//!     .with_logging()
//!     .with_bearer_auth("my-token")
//!     .middleware(middleware::from_fn(|request: Request, next: Next<'_>| {
//!         next.run(request.with_header("X-Client", "courier"))
//!     }))
//!     .build()?;
//! ```

mod basic_auth;
mod bearer_auth;
mod chain;
mod logging;
mod metrics;

pub use basic_auth::BasicAuth;
pub use bearer_auth::BearerAuth;
pub use chain::MiddlewareChain;
pub use logging::{LogLevel, Logging};
pub use metrics::{
    METRIC_REQUEST_DURATION, METRIC_REQUESTS_IN_FLIGHT, METRIC_REQUESTS_TOTAL, Metrics,
};

use crate::{RawResponse, Request, Result};

/// A request/response interceptor.
pub trait Middleware: Send + Sync {
    /// Handle `request`, usually by passing it (possibly rewritten) to `next`.
    ///
    /// # Errors
    ///
    /// Returns an error if this middleware or anything after it fails.
    fn handle(&self, request: Request, next: Next<'_>) -> Result<RawResponse>;
}

/// The rest of the chain after the current middleware.
///
/// Consumed by [`Next::run`]; a middleware that drops it short-circuits the
/// chain and the transport is never called.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    inner: &'a (dyn Fn(Request) -> Result<RawResponse> + 'a),
}

impl<'a> Next<'a> {
    pub(crate) fn new(inner: &'a (dyn Fn(Request) -> Result<RawResponse> + 'a)) -> Self {
        Self { inner }
    }

    /// Pass `request` to the remaining middleware and the transport.
    ///
    /// # Errors
    ///
    /// Returns the first error raised further down the chain.
    pub fn run(self, request: Request) -> Result<RawResponse> {
        (self.inner)(request)
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

/// Middleware built from a closure, see [`from_fn`].
#[derive(Clone)]
pub struct FromFn<F> {
    f: F,
}

impl<F> std::fmt::Debug for FromFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FromFn").finish_non_exhaustive()
    }
}

/// Adapt a closure into a [`Middleware`].
///
/// ```ignore
/// let trace = from_fn(|request: Request, next: Next<'_>| {
///     next.run(request.with_header("X-Trace-Id", "42"))
/// });
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(Request, Next<'_>) -> Result<RawResponse> + Send + Sync,
{
    FromFn { f }
}

impl<F> Middleware for FromFn<F>
where
    F: Fn(Request, Next<'_>) -> Result<RawResponse> + Send + Sync,
{
    fn handle(&self, request: Request, next: Next<'_>) -> Result<RawResponse> {
        (self.f)(request, next)
    }
}

impl<M: Middleware + ?Sized> Middleware for std::sync::Arc<M> {
    fn handle(&self, request: Request, next: Next<'_>) -> Result<RawResponse> {
        (**self).handle(request, next)
    }
}

//! Middleware composition.

use std::cell::RefCell;
use std::sync::Arc;

use super::{Middleware, Next};
use crate::{RawResponse, Request, Result};

/// The composed call chain: a request plus the transport call to end on.
type Handler =
    Arc<dyn Fn(Request, &dyn Fn(Request) -> Result<RawResponse>) -> Result<RawResponse> + Send + Sync>;

/// Ordered middleware, folded into a single handler when the chain is built.
///
/// For `[m0, m1, m2]` the handler runs `m0` around `m1` around `m2` around
/// the terminal transport call: pre-processing happens in registration order
/// and post-processing in reverse.
#[derive(Clone)]
pub struct MiddlewareChain {
    middleware: Vec<Arc<dyn Middleware>>,
    handler: Handler,
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("len", &self.middleware.len())
            .finish_non_exhaustive()
    }
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl MiddlewareChain {
    /// Build a chain; `middleware[0]` is the outermost.
    #[must_use]
    pub fn new(middleware: Vec<Arc<dyn Middleware>>) -> Self {
        let handler = compose(&middleware);
        Self {
            middleware,
            handler,
        }
    }

    /// Append `middleware` as the new innermost entry and rebuild the handler.
    pub fn push(&mut self, middleware: impl Middleware + 'static) {
        self.middleware.push(Arc::new(middleware));
        self.handler = compose(&self.middleware);
    }

    /// Number of middleware in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    /// Returns `true` if the chain has no middleware.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Run `request` through the chain, ending with `terminal`.
    ///
    /// Returns the request the terminal actually received (after every
    /// middleware rewrite) together with the post-processed response. When a
    /// middleware answers without calling the terminal, the original request
    /// is returned; when the terminal runs several times, the last request
    /// wins.
    ///
    /// # Errors
    ///
    /// Any middleware or terminal error, unmodified.
    pub fn dispatch<T>(&self, request: Request, terminal: T) -> Result<(Request, RawResponse)>
    where
        T: Fn(&Request) -> Result<RawResponse>,
    {
        let original = request.clone();
        let sent = RefCell::new(None);
        let record_sent = |request: Request| {
            let result = terminal(&request);
            *sent.borrow_mut() = Some(request);
            result
        };

        let response = (self.handler)(request, &record_sent)?;
        Ok((sent.into_inner().unwrap_or(original), response))
    }
}

/// Right-fold: the last middleware wraps the terminal, each earlier one wraps the rest.
fn compose(middleware: &[Arc<dyn Middleware>]) -> Handler {
    let terminal: Handler = Arc::new(
        |request: Request, terminal: &dyn Fn(Request) -> Result<RawResponse>| terminal(request),
    );

    middleware.iter().rev().fold(terminal, |inner, current| {
        let current = Arc::clone(current);
        Arc::new(
            move |request: Request, terminal: &dyn Fn(Request) -> Result<RawResponse>| {
                let rest = |request: Request| (*inner)(request, terminal);
                current.handle(request, Next::new(&rest))
            },
        )
    })
}

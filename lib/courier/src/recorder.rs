//! Exchange recording and test assertions.
//!
//! Every successful [`Client::send`](crate::Client::send) appends a
//! [`RecordedExchange`] to the client's [`RecordedExchangeLog`], in fake and
//! real mode alike. Tests query the log directly or through the client's
//! `assert_*` helpers, which report through a [`FailureReporter`].

use std::sync::{Arc, Mutex, PoisonError};

use crate::{Request, Response};

/// A completed exchange: the request as handed to the transport and the
/// response it produced.
#[derive(Debug, Clone)]
pub struct RecordedExchange {
    request: Arc<Request>,
    response: Response,
}

impl RecordedExchange {
    /// Record `response`, keyed by the request it carries.
    #[must_use]
    pub fn new(response: Response) -> Self {
        Self {
            request: response.shared_request(),
            response,
        }
    }

    /// The request as handed to the transport.
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The response returned to the caller.
    #[must_use]
    pub const fn response(&self) -> &Response {
        &self.response
    }
}

/// Append-only log of exchanges, in send order.
#[derive(Debug, Default)]
pub struct RecordedExchangeLog {
    exchanges: Mutex<Vec<RecordedExchange>>,
}

impl RecordedExchangeLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an exchange.
    pub fn append(&self, exchange: RecordedExchange) {
        self.exchanges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(exchange);
    }

    /// Snapshot of every exchange, oldest first.
    #[must_use]
    pub fn all(&self) -> Vec<RecordedExchange> {
        self.exchanges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the exchanges accepted by `filter`, oldest first.
    pub fn matching<F>(&self, mut filter: F) -> Vec<RecordedExchange>
    where
        F: FnMut(&Request, &Response) -> bool,
    {
        self.exchanges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|exchange| filter(exchange.request(), exchange.response()))
            .cloned()
            .collect()
    }

    /// Number of recorded exchanges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.exchanges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing was sent yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Receives the outcome of every assertion.
pub trait FailureReporter: Send + Sync {
    /// `passed` is the assertion outcome; `message` describes it.
    fn report(&self, passed: bool, message: &str);
}

impl<F> FailureReporter for F
where
    F: Fn(bool, &str) + Send + Sync,
{
    fn report(&self, passed: bool, message: &str) {
        self(passed, message);
    }
}

/// Default reporter: panics with the message when an assertion fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanicReporter;

impl FailureReporter for PanicReporter {
    fn report(&self, passed: bool, message: &str) {
        if !passed {
            panic!("{message}");
        }
    }
}

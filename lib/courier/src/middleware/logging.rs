//! Request/response logging middleware.
//!
//! This middleware logs HTTP requests and responses using the `tracing` crate.

use std::time::Instant;

use tracing::{Level, debug, info, span, warn};

use super::{Middleware, Next};
use crate::{RawResponse, Request, Result};

/// Log level for the logging middleware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Log at debug level (request/response details).
    Debug,
    /// Log at info level (summary only).
    #[default]
    Info,
}

/// Middleware that logs requests and responses.
///
/// # Example
///
/// ```ignore
/// use courier::Client;
/// use courier::middleware::Logging;
///
/// let client = Client::builder()
///     .middleware(Logging::debug())
///     .build()?;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Logging {
    level: LogLevel,
}

impl Logging {
    /// Create a new logging middleware with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logging middleware that logs at debug level.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }

    /// Configured level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }
}

impl Middleware for Logging {
    fn handle(&self, request: Request, next: Next<'_>) -> Result<RawResponse> {
        let method = request.method();
        let url = request.url().to_string();

        let span = span!(Level::INFO, "http_request", %method, %url);
        let _entered = span.enter();
        let start = Instant::now();

        match self.level {
            LogLevel::Debug => {
                debug!(
                    method = %method,
                    url = %url,
                    headers = ?request.headers(),
                    "sending request"
                );
            }
            LogLevel::Info => {
                info!(method = %method, url = %url, "sending request");
            }
        }

        let result = next.run(request);

        // Saturating conversion to u64
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &result {
            Ok(response) => {
                let status = response.status();
                if response.is_success() {
                    info!(status, elapsed_ms, "request completed");
                } else {
                    warn!(status, elapsed_ms, "request failed with HTTP error");
                }
                if self.level == LogLevel::Debug {
                    debug!(headers = ?response.headers(), bytes = response.body().len(), "response");
                }
            }
            Err(err) => {
                warn!(error = %err, elapsed_ms, "request failed");
            }
        }

        result
    }
}

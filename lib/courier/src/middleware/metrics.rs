//! Metrics middleware using the metrics crate facade.
//!
//! Exchanges are measured through the `metrics` macros, so any installed
//! recorder (Prometheus, `StatsD`, an in-memory debugging recorder, ...)
//! receives them. Without a recorder the calls are no-ops.

use std::time::Instant;

use tracing::debug;

use super::{Middleware, Next};
use crate::{RawResponse, Request, Result};

/// Labels used for metrics.
const LABEL_METHOD: &str = "method";
const LABEL_STATUS: &str = "status";

/// Counter of completed exchanges, by method and status.
pub const METRIC_REQUESTS_TOTAL: &str = "http_client_requests_total";
/// Histogram of exchange durations, in seconds.
pub const METRIC_REQUEST_DURATION: &str = "http_client_request_duration_seconds";
/// Gauge of exchanges currently in the rest of the chain.
pub const METRIC_REQUESTS_IN_FLIGHT: &str = "http_client_requests_in_flight";

/// Middleware recording HTTP metrics.
///
/// Records the following metrics:
/// - `http_client_requests_total` (counter): number of exchanges, labeled by
///   method and status (`"error"` when the exchange failed)
/// - `http_client_request_duration_seconds` (histogram): duration, labeled
///   by method
/// - `http_client_requests_in_flight` (gauge): exchanges currently running
///
/// # Example
///
/// ```ignore
/// use courier::Client;
///
/// let client = Client::builder().with_metrics().build()?;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Metrics {
    _private: (),
}

impl Metrics {
    /// Create a metrics middleware.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Middleware for Metrics {
    fn handle(&self, request: Request, next: Next<'_>) -> Result<RawResponse> {
        let method = request.method().to_string();
        let start = Instant::now();

        metrics::gauge!(METRIC_REQUESTS_IN_FLIGHT).increment(1.0);
        let result = next.run(request);
        metrics::gauge!(METRIC_REQUESTS_IN_FLIGHT).decrement(1.0);

        let elapsed = start.elapsed();
        metrics::histogram!(METRIC_REQUEST_DURATION, LABEL_METHOD => method.clone())
            .record(elapsed.as_secs_f64());

        let status = match &result {
            Ok(response) => response.status().to_string(),
            Err(_) => "error".to_string(),
        };
        debug!(%method, %status, ?elapsed, "exchange measured");

        metrics::counter!(
            METRIC_REQUESTS_TOTAL,
            LABEL_METHOD => method,
            LABEL_STATUS => status
        )
        .increment(1);

        result
    }
}

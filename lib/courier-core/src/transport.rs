//! Transport trait.

use crate::{RawResponse, Request, Result};

/// Performs one network exchange, real or simulated.
///
/// Implementations block until the response is complete. Failures of the
/// exchange itself are reported as transport errors (see
/// [`crate::Error::is_transport`]) and are never retried by courier.
pub trait Transport: Send + Sync {
    /// Send `request` and return the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    /// - No canned response (fake transports)
    fn send(&self, request: &Request) -> Result<RawResponse>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, request: &Request) -> Result<RawResponse> {
        (**self).send(request)
    }
}

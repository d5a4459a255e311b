//! Bearer token authentication middleware.
//!
//! This middleware adds an `Authorization: Bearer <token>` header to all
//! outgoing requests, replacing any existing `Authorization` header.

use std::sync::Arc;

use super::{Middleware, Next};
use crate::{RawResponse, Request, Result};

/// Middleware that adds bearer token authentication to requests.
///
/// # Example
///
/// ```ignore
/// use courier::Client;
/// use courier::middleware::BearerAuth;
///
/// let client = Client::builder()
///     .middleware(BearerAuth::new("my-secret-token"))
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct BearerAuth {
    token: Arc<str>,
}

impl BearerAuth {
    /// Create a new bearer auth middleware with the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Arc::from(token.into()),
        }
    }
}

impl Middleware for BearerAuth {
    fn handle(&self, request: Request, next: Next<'_>) -> Result<RawResponse> {
        next.run(request.with_header("Authorization", format!("Bearer {}", self.token)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::MiddlewareChain;
    use crate::{Headers, Method};

    #[test]
    fn bearer_auth_sets_header() {
        let mut chain = MiddlewareChain::default();
        chain.push(BearerAuth::new("test-token"));

        let request = Request::new(
            Method::Get,
            url::Url::parse("https://dummyjson.com/auth/me").expect("valid URL"),
        )
        .with_header("authorization", "stale");

        let (sent, _) = chain
            .dispatch(request, |_| Ok(RawResponse::new(200, Headers::new(), "")))
            .expect("dispatch");

        assert_eq!(sent.header("Authorization"), Some("Bearer test-token"));
        assert_eq!(sent.headers().len(), 1);
    }
}

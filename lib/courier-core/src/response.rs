//! HTTP response handling.
//!
//! Two shapes exist:
//! - [`RawResponse`] is what a transport produces and what middleware sees:
//!   status, headers and body.
//! - [`Response`] is what the client hands back: the raw response paired with
//!   the request that was actually sent and the active pagination policy.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

use crate::{Headers, PaginationPolicy, Request, Result};

// ============================================================================
// Raw Response
// ============================================================================

/// HTTP response with status, headers, and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    status: u16,
    headers: Headers,
    body: Bytes,
}

impl RawResponse {
    /// Creates a new response.
    #[must_use]
    pub fn new(status: u16, headers: Headers, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Single header value by name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns a copy with `name` set to `value`.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Consume into (status, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (u16, Headers, Bytes) {
        (self.status, self.headers, self.body)
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Status is 3xx.
    #[must_use]
    pub const fn is_redirection(&self) -> bool {
        self.status >= 300 && self.status < 400
    }

    /// Status is 4xx.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Status is 5xx.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }

    /// Deserialize the response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        crate::from_json(&self.body)
    }

    /// Get the response body as text.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid UTF-8.
    pub fn text(&self) -> std::result::Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }
}

// ============================================================================
// Paired Response
// ============================================================================

/// A response paired with the request that produced it.
///
/// Cloning is cheap: the body is reference counted and the request and
/// pagination policy are shared.
#[derive(Clone)]
pub struct Response {
    raw: RawResponse,
    request: Arc<Request>,
    pagination: Option<Arc<dyn PaginationPolicy>>,
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.raw.status)
            .field("method", &self.request.method())
            .field("url", &self.request.url().as_str())
            .field("pagination", &self.pagination)
            .finish_non_exhaustive()
    }
}

impl Response {
    /// Pairs a raw response with the request that was sent for it.
    #[must_use]
    pub fn new(
        request: impl Into<Arc<Request>>,
        raw: RawResponse,
        pagination: Option<Arc<dyn PaginationPolicy>>,
    ) -> Self {
        Self {
            raw,
            request: request.into(),
            pagination,
        }
    }

    /// The request that produced this response, as handed to the transport.
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Shared handle on the producing request.
    #[must_use]
    pub fn shared_request(&self) -> Arc<Request> {
        Arc::clone(&self.request)
    }

    /// Pagination policy attached when the response was received.
    #[must_use]
    pub fn pagination(&self) -> Option<&Arc<dyn PaginationPolicy>> {
        self.pagination.as_ref()
    }

    /// The transport-level response.
    #[must_use]
    pub const fn raw(&self) -> &RawResponse {
        &self.raw
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.raw.status()
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        self.raw.headers()
    }

    /// Single header value by name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.raw.header(name)
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        self.raw.body()
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.raw.is_success()
    }

    /// Deserialize the response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        self.raw.json()
    }

    /// Parse the body as an untyped JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not JSON.
    pub fn json_value(&self) -> Result<Value> {
        self.raw.json()
    }

    /// Value at a dotted `path` of a JSON body (`"total"`, `"products.0.title"`).
    ///
    /// Returns `None` if the body is not JSON or the path does not resolve.
    #[must_use]
    pub fn json_path(&self, path: &str) -> Option<Value> {
        let document = self.json_value().ok()?;
        lookup_path(&document, path).cloned()
    }

    /// Value at a dotted `path`, or `default` when absent or of another type.
    #[must_use]
    pub fn json_or<T: serde::de::DeserializeOwned>(&self, path: &str, default: T) -> T {
        self.json_path(path)
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or(default)
    }

    /// Get the response body as text.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid UTF-8.
    pub fn text(&self) -> std::result::Result<String, std::string::FromUtf8Error> {
        self.raw.text()
    }

    /// Whether the attached pagination policy reports another page.
    ///
    /// A response without a policy has no next page.
    #[must_use]
    pub fn has_next_page(&self) -> bool {
        self.pagination
            .as_ref()
            .is_some_and(|policy| policy.has_next_page(self))
    }

    /// The request for the following page, if there is one.
    ///
    /// # Errors
    ///
    /// Returns the policy's error when the next request cannot be derived.
    pub fn next_page_request(&self) -> Result<Option<Request>> {
        match &self.pagination {
            Some(policy) if policy.has_next_page(self) => {
                policy.next_page_request(self).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Consume into the transport-level response.
    #[must_use]
    pub fn into_raw(self) -> RawResponse {
        self.raw
    }
}

/// Walks a dotted path through objects and arrays (`$.` prefix allowed).
#[must_use]
pub fn lookup_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() {
        return Some(value);
    }

    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get(index)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::Method;

    fn raw_json(value: &Value) -> RawResponse {
        RawResponse::new(
            200,
            [("Content-Type", "application/json")].into_iter().collect(),
            serde_json::to_vec(value).expect("serialize"),
        )
    }

    fn paired(raw: RawResponse) -> Response {
        let url = url::Url::parse("https://dummyjson.com/products?limit=2").expect("valid URL");
        Response::new(Request::new(Method::Get, url), raw, None)
    }

    #[test]
    fn raw_response_status_checks() {
        let response = RawResponse::new(301, Headers::new(), Bytes::new());
        assert!(response.is_redirection());

        let response = RawResponse::new(404, Headers::new(), Bytes::new());
        assert!(response.is_client_error());

        let response = RawResponse::new(500, Headers::new(), Bytes::new());
        assert!(response.is_server_error());
    }

    #[test]
    fn raw_response_json() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct Product {
            id: u64,
            title: String,
        }

        let response = raw_json(&json!({"id": 1, "title": "iPhone 9"}));
        let product: Product = response.json().expect("deserialize");
        assert_eq!(
            product,
            Product {
                id: 1,
                title: "iPhone 9".to_string()
            }
        );
    }

    #[test]
    fn paired_response_keeps_request() {
        let response = paired(raw_json(&json!({})));

        assert_eq!(response.status(), 200);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.request().method(), Method::Get);
        assert_eq!(response.request().url().query(), Some("limit=2"));
    }

    #[test]
    fn json_path_reads_nested_values() {
        let response = paired(raw_json(&json!({
            "products": [{"title": "iPhone 9"}, {"title": "iPhone X"}],
            "total": 100
        })));

        assert_eq!(response.json_path("total"), Some(json!(100)));
        assert_eq!(response.json_path("products.1.title"), Some(json!("iPhone X")));
        assert_eq!(response.json_path("$.products.0.title"), Some(json!("iPhone 9")));
        assert_eq!(response.json_path("products.9.title"), None);
        assert_eq!(response.json_path("missing"), None);
    }

    #[test]
    fn json_or_falls_back_to_default() {
        let response = paired(raw_json(&json!({"total": 100, "skip": "zero"})));

        assert_eq!(response.json_or("total", 0_u64), 100);
        assert_eq!(response.json_or("limit", 30_u64), 30);
        assert_eq!(response.json_or("skip", 0_u64), 0);
    }

    #[test]
    fn json_path_on_text_body_is_none() {
        let response = paired(RawResponse::new(200, Headers::new(), "plain text"));
        assert_eq!(response.json_path("total"), None);
        assert_eq!(response.text().expect("utf8"), "plain text");
    }

    #[test]
    fn no_policy_means_no_next_page() {
        let response = paired(raw_json(&json!({"total": 100, "skip": 0, "limit": 2})));
        assert!(!response.has_next_page());
        assert!(response.next_page_request().expect("no policy").is_none());
    }
}

//! In-memory transport for tests.
//!
//! A [`FakeTransport`] holds an ordered list of [`Stub`]s, each pairing a
//! [`RequestMatcher`] with a canned [`FakeResponse`]. Sending a request
//! returns the response of the first stub whose matcher accepts it; stubs
//! registered earlier win. A request no stub accepts fails with
//! [`Error::NoMatchingStub`].
//!
//! # Example
//!
//! ```ignore
//! use courier::fake::{FakeResponse, FakeTransport};
//! use serde_json::json;
//!
//! let fake = FakeTransport::new();
//! fake.stub_url("https://dummyjson.com/products/1", FakeResponse::json(json!({"id": 1})));
//! fake.stub(|request: &Request| request.method() == Method::Delete, FakeResponse::status(204));
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{ContentType, Error, Headers, RawResponse, Request, Result, Transport};

// ============================================================================
// Matchers
// ============================================================================

/// Decides whether a stub answers a request.
pub trait RequestMatcher: Send + Sync {
    /// Returns `true` if the stub should answer `request`.
    fn matches(&self, request: &Request) -> bool;
}

impl<F> RequestMatcher for F
where
    F: Fn(&Request) -> bool + Send + Sync,
{
    fn matches(&self, request: &Request) -> bool {
        self(request)
    }
}

/// Matches requests whose full URL equals the expected one.
///
/// The expected URL is canonicalised the same way request URLs are, so
/// `"https://dummyjson.com"` matches a request for `https://dummyjson.com/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMatcher {
    url: String,
}

impl UrlMatcher {
    /// Match requests for `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let url = url::Url::parse(&url).map_or(url, String::from);
        Self { url }
    }

    /// The canonical URL this matcher expects.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RequestMatcher for UrlMatcher {
    fn matches(&self, request: &Request) -> bool {
        request.url().as_str() == self.url
    }
}

/// Matches every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyRequest;

impl RequestMatcher for AnyRequest {
    fn matches(&self, _request: &Request) -> bool {
        true
    }
}

// ============================================================================
// Canned responses
// ============================================================================

/// Body of a [`FakeResponse`].
#[derive(Debug, Clone, PartialEq)]
pub enum FakeBody {
    /// A structured payload, serialized as JSON.
    Json(Value),
    /// A raw string body.
    Text(String),
}

impl From<Value> for FakeBody {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for FakeBody {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for FakeBody {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// A canned response returned by a stub.
#[derive(Debug, Clone, PartialEq)]
pub struct FakeResponse {
    status: u16,
    headers: Headers,
    body: FakeBody,
}

impl Default for FakeResponse {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Headers::new(),
            body: FakeBody::Text(String::new()),
        }
    }
}

impl FakeResponse {
    /// A response with the given status and body, and no headers.
    #[must_use]
    pub fn new(status: u16, body: impl Into<FakeBody>) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    /// `200 OK` with a JSON payload.
    #[must_use]
    pub fn json(value: Value) -> Self {
        Self::new(200, FakeBody::Json(value))
    }

    /// `200 OK` with a text body.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(200, FakeBody::Text(text.into()))
    }

    /// Empty body with the given status.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self::new(status, FakeBody::Text(String::new()))
    }

    /// Returns a copy with the given status.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Returns a copy with `name` set to `value`.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns a copy with the given headers added.
    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers
            .extend(headers.iter().map(|(name, value)| (name.to_string(), value.to_string())));
        self
    }

    /// Build the transport response.
    ///
    /// JSON payloads get `Content-Type: application/json` unless a content
    /// type was set explicitly.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON payload cannot be serialized.
    pub fn to_raw(&self) -> Result<RawResponse> {
        let mut headers = self.headers.clone();
        let body = match &self.body {
            FakeBody::Json(value) => {
                if !headers.contains("Content-Type") {
                    headers.insert("Content-Type", ContentType::Json.as_str());
                }
                crate::to_json(value)?
            }
            FakeBody::Text(text) => Bytes::from(text.clone()),
        };
        Ok(RawResponse::new(self.status, headers, body))
    }
}

// ============================================================================
// Stubs & transport
// ============================================================================

/// A registered (matcher, canned response) pair.
#[derive(Clone)]
pub struct Stub {
    matcher: Arc<dyn RequestMatcher>,
    response: FakeResponse,
}

impl fmt::Debug for Stub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stub")
            .field("response", &self.response)
            .finish_non_exhaustive()
    }
}

impl Stub {
    /// Pair `matcher` with `response`.
    pub fn new(matcher: impl RequestMatcher + 'static, response: FakeResponse) -> Self {
        Self {
            matcher: Arc::new(matcher),
            response,
        }
    }

    /// Returns `true` if this stub answers `request`.
    #[must_use]
    pub fn matches(&self, request: &Request) -> bool {
        self.matcher.matches(request)
    }

    /// The canned response.
    #[must_use]
    pub const fn response(&self) -> &FakeResponse {
        &self.response
    }
}

/// In-memory [`Transport`] answering from registered stubs.
///
/// Stubs can be added through a shared reference, so a transport already
/// installed in a client can still be configured.
#[derive(Debug, Default)]
pub struct FakeTransport {
    stubs: Mutex<Vec<Stub>>,
}

impl FakeTransport {
    /// Creates a transport without stubs; every request fails until one is added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stub at the lowest priority.
    pub fn push(&self, stub: Stub) {
        self.stubs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(stub);
    }

    /// Register `response` for requests accepted by `matcher`.
    pub fn stub(&self, matcher: impl RequestMatcher + 'static, response: FakeResponse) {
        self.push(Stub::new(matcher, response));
    }

    /// Register `response` for requests to exactly `url`.
    pub fn stub_url(&self, url: impl Into<String>, response: FakeResponse) {
        self.stub(UrlMatcher::new(url), response);
    }

    /// Number of registered stubs.
    #[must_use]
    pub fn stub_count(&self) -> usize {
        self.stubs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Transport for FakeTransport {
    fn send(&self, request: &Request) -> Result<RawResponse> {
        // Matchers run unlocked: they may call back into this transport.
        let stubs = self
            .stubs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some((index, stub)) = stubs
            .iter()
            .enumerate()
            .find(|(_, stub)| stub.matches(request))
        else {
            warn!(method = %request.method(), url = %request.url(), "no stub matches request");
            return Err(Error::no_matching_stub(
                request.method(),
                request.url().as_str(),
            ));
        };

        debug!(
            method = %request.method(),
            url = %request.url(),
            stub = index,
            status = stub.response().status,
            "answering from stub"
        );
        stub.response().to_raw()
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;
    use crate::Method;

    fn get(url: &str) -> Request {
        Request::new(Method::Get, url::Url::parse(url).expect("valid URL"))
    }

    #[test]
    fn exact_url_stub_answers() {
        let fake = FakeTransport::new();
        fake.stub_url(
            "https://dummyjson.com/products/1",
            FakeResponse::json(json!({"id": 1})),
        );

        let response = fake
            .send(&get("https://dummyjson.com/products/1"))
            .expect("stubbed");

        check!(response.status() == 200);
        check!(response.header("content-type") == Some("application/json"));
        check!(response.body().as_ref() == br#"{"id":1}"#);
    }

    #[test]
    fn first_registered_stub_wins() {
        let fake = FakeTransport::new();
        fake.stub(AnyRequest, FakeResponse::text("first"));
        fake.stub(AnyRequest, FakeResponse::text("second"));

        let response = fake.send(&get("https://dummyjson.com/users")).expect("stubbed");

        check!(response.body().as_ref() == b"first");
        check!(fake.stub_count() == 2);
    }

    #[test]
    fn later_stub_answers_when_earlier_does_not_match() {
        let fake = FakeTransport::new();
        fake.stub_url("https://dummyjson.com/carts", FakeResponse::text("carts"));
        fake.stub(
            |request: &Request| request.url().path().starts_with("/users"),
            FakeResponse::text("users"),
        );

        let response = fake.send(&get("https://dummyjson.com/users/5")).expect("stubbed");

        check!(response.body().as_ref() == b"users");
    }

    #[test]
    fn no_match_reports_request_line() {
        let fake = FakeTransport::new();
        fake.stub_url("https://dummyjson.com/carts", FakeResponse::status(204));

        let result = fake.send(&get("https://dummyjson.com/products?limit=5"));

        let_assert!(Err(Error::NoMatchingStub { method, url }) = result);
        check!(method == Method::Get);
        check!(url == "https://dummyjson.com/products?limit=5");
    }

    #[test]
    fn url_matcher_canonicalises_expected_url() {
        let matcher = UrlMatcher::new("https://dummyjson.com");
        check!(matcher.url() == "https://dummyjson.com/");
        check!(matcher.matches(&get("https://dummyjson.com/")));
        check!(!matcher.matches(&get("https://dummyjson.com/?q=1")));
    }

    #[test]
    fn explicit_content_type_is_kept() {
        let raw = FakeResponse::json(json!([1, 2]))
            .with_status(201)
            .with_header("content-type", "application/vnd.api+json")
            .to_raw()
            .expect("raw");

        check!(raw.status() == 201);
        check!(raw.header("Content-Type") == Some("application/vnd.api+json"));
        check!(raw.headers().len() == 1);
    }

    #[test]
    fn text_body_has_no_default_content_type() {
        let raw = FakeResponse::new(500, "boom").to_raw().expect("raw");

        check!(raw.status() == 500);
        check!(raw.headers().is_empty());
        check!(raw.text().expect("utf8") == "boom");
    }

    #[test]
    fn matcher_may_inspect_its_own_transport() {
        let transport = Arc::new(FakeTransport::new());
        let inner = Arc::clone(&transport);
        transport.stub(
            move |_: &Request| inner.stub_count() == 2,
            FakeResponse::text("two stubs"),
        );
        transport.stub(AnyRequest, FakeResponse::new(404, "fallback"));

        let raw = transport
            .send(&get("https://dummyjson.com/products"))
            .expect("response");

        check!(raw.status() == 200);
        check!(raw.text().expect("utf8") == "two stubs");
    }
}

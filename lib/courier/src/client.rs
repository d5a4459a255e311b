//! Request executor.
//!
//! [`Client`] resolves URLs against an optional base, runs every request
//! through its [`MiddlewareChain`] and transport, pairs the result with the
//! request actually sent, and records the exchange.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use crate::fake::{FakeBody, FakeResponse, FakeTransport, RequestMatcher};
use crate::middleware::{BasicAuth, BearerAuth, Logging, Metrics, Middleware, MiddlewareChain};
use crate::pagination::Pages;
use crate::query::{is_absolute, merge_query};
use crate::recorder::{FailureReporter, PanicReporter, RecordedExchange, RecordedExchangeLog};
use crate::transport::HyperTransport;
use crate::{
    ContentType, Error, Headers, Method, PaginationPolicy, Request, Response, Result, Transport,
    TransportConfig, TransportConfigBuilder, Url, to_form, to_json, to_query_string,
};

/// Empty parameter set.
///
/// Serializes as an empty map: no query pairs, `{}` as a JSON body and an
/// empty form body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoParams;

impl Serialize for NoParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_map(Some(0))?.end()
    }
}

/// Shorthand for "no parameters", e.g. `client.get("/products", &NO_PARAMS)`.
pub const NO_PARAMS: NoParams = NoParams;

// ============================================================================
// Client
// ============================================================================

/// HTTP API client with middleware, pagination and a fake mode for tests.
///
/// # Example
///
/// ```ignore
/// use courier::{Client, NO_PARAMS, SkipLimitPolicy};
///
/// let client = Client::builder()
///     .base_url("https://dummyjson.com")
///     .pagination(SkipLimitPolicy::new())
///     .with_logging()
///     .build()?;
///
/// let products = client.get("/products", &[("limit", 25)])?;
/// let login = client.post("/auth/login", &serde_json::json!({"username": "emilys"}))?;
/// let health = client.get("/test", &NO_PARAMS)?;
/// ```
pub struct Client {
    base_url: Option<String>,
    pagination: Option<Arc<dyn PaginationPolicy>>,
    middleware: MiddlewareChain,
    transport: Arc<dyn Transport>,
    fake: Option<Arc<FakeTransport>>,
    log: RecordedExchangeLog,
    reporter: Arc<dyn FailureReporter>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("pagination", &self.pagination)
            .field("middleware", &self.middleware)
            .field("fake", &self.fake.is_some())
            .field("recorded", &self.log.len())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a client with a network transport and no base URL, policy or
    /// middleware.
    ///
    /// # Errors
    ///
    /// Returns an error if the network transport cannot be created.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Configured base URL.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Pagination policy attached to every response.
    #[must_use]
    pub fn pagination(&self) -> Option<&Arc<dyn PaginationPolicy>> {
        self.pagination.as_ref()
    }

    /// The middleware chain requests go through.
    #[must_use]
    pub const fn middleware(&self) -> &MiddlewareChain {
        &self.middleware
    }

    // ========================================================================
    // Sending
    // ========================================================================

    /// Resolve `url` for a request.
    ///
    /// An absolute URL is used as is; anything else is appended to the base
    /// URL verbatim. For `GET`, `params` are merged into the query string,
    /// replacing existing pairs with the same key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the result is not a valid URL (for
    /// example a relative URL without a base), or a serialization error if
    /// `params` cannot be encoded as a query string.
    pub fn build_url<P>(&self, method: Method, url: &str, params: &P) -> Result<Url>
    where
        P: Serialize + ?Sized,
    {
        let full = match &self.base_url {
            Some(base) if !is_absolute(url) => format!("{base}{url}"),
            _ => url.to_string(),
        };

        let mut resolved = Url::parse(&full)?;
        if method.is_get() {
            let encoded = to_query_string(params)?;
            merge_query(&mut resolved, &encoded);
        }
        Ok(resolved)
    }

    /// Send `request` through the middleware chain and the transport.
    ///
    /// The returned response carries the request as the transport received
    /// it, and the client's pagination policy. The exchange is recorded.
    ///
    /// # Errors
    ///
    /// Returns the first middleware or transport error; nothing is recorded
    /// in that case.
    pub fn send(&self, request: Request) -> Result<Response> {
        let transport = &self.transport;
        let (sent, raw) = self
            .middleware
            .dispatch(request, |request| transport.send(request))?;

        let response = Response::new(sent, raw, self.pagination.clone());
        debug!(
            method = %response.request().method(),
            url = %response.request().url(),
            status = response.status(),
            "exchange recorded"
        );
        self.log.append(RecordedExchange::new(response.clone()));

        Ok(response)
    }

    /// Send a JSON request.
    ///
    /// Sets `Content-Type` and `Accept` to `application/json`. For `GET`,
    /// `params` go to the query string; otherwise they are the JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL or `params` cannot be encoded, or if
    /// sending fails.
    pub fn json<P>(&self, method: Method, url: &str, params: &P) -> Result<Response>
    where
        P: Serialize + ?Sized,
    {
        let mut builder = Request::builder(method, self.build_url(method, url, params)?)
            .header("Content-Type", ContentType::Json.as_str())
            .header("Accept", ContentType::Json.as_str());
        if !method.is_get() {
            builder = builder.body(to_json(params)?);
        }
        self.send(builder.build())
    }

    /// Send a form-encoded request.
    ///
    /// Sets `Content-Type: application/x-www-form-urlencoded`. For `GET`,
    /// `params` go to the query string; otherwise they are the form body.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL or `params` cannot be encoded, or if
    /// sending fails.
    pub fn form<P>(&self, method: Method, url: &str, params: &P) -> Result<Response>
    where
        P: Serialize + ?Sized,
    {
        let mut builder = Request::builder(method, self.build_url(method, url, params)?)
            .header("Content-Type", ContentType::FormUrlEncoded.as_str());
        if !method.is_get() {
            builder = builder.body(to_form(params)?);
        }
        self.send(builder.build())
    }

    /// `GET` with [`Client::json`].
    ///
    /// # Errors
    ///
    /// See [`Client::json`].
    pub fn get<P: Serialize + ?Sized>(&self, url: &str, params: &P) -> Result<Response> {
        self.json(Method::Get, url, params)
    }

    /// `POST` with [`Client::json`].
    ///
    /// # Errors
    ///
    /// See [`Client::json`].
    pub fn post<P: Serialize + ?Sized>(&self, url: &str, params: &P) -> Result<Response> {
        self.json(Method::Post, url, params)
    }

    /// `PUT` with [`Client::json`].
    ///
    /// # Errors
    ///
    /// See [`Client::json`].
    pub fn put<P: Serialize + ?Sized>(&self, url: &str, params: &P) -> Result<Response> {
        self.json(Method::Put, url, params)
    }

    /// `PATCH` with [`Client::json`].
    ///
    /// # Errors
    ///
    /// See [`Client::json`].
    pub fn patch<P: Serialize + ?Sized>(&self, url: &str, params: &P) -> Result<Response> {
        self.json(Method::Patch, url, params)
    }

    /// `DELETE` with [`Client::json`].
    ///
    /// # Errors
    ///
    /// See [`Client::json`].
    pub fn delete<P: Serialize + ?Sized>(&self, url: &str, params: &P) -> Result<Response> {
        self.json(Method::Delete, url, params)
    }

    // ========================================================================
    // Pagination
    // ========================================================================

    /// Fetch the page following `response`, if its policy reports one.
    ///
    /// # Errors
    ///
    /// Returns an error if the next request cannot be derived or sent.
    pub fn next_page(&self, response: &Response) -> Result<Option<Response>> {
        match response.next_page_request()? {
            Some(request) => self.send(request).map(Some),
            None => Ok(None),
        }
    }

    /// Lazy page sequence starting with `start`.
    #[must_use]
    pub fn pages(&self, start: Response) -> Pages<'_> {
        Pages::new(self, start)
    }

    /// Call `f` on `start` and on every following page, in order.
    ///
    /// # Errors
    ///
    /// Stops at, and returns, the first error from a send or from `f`.
    pub fn for_each_page<F, E>(&self, start: Response, mut f: F) -> std::result::Result<(), E>
    where
        F: FnMut(Response) -> std::result::Result<(), E>,
        E: From<Error>,
    {
        for page in self.pages(start) {
            f(page?)?;
        }
        Ok(())
    }

    // ========================================================================
    // Fake mode
    // ========================================================================

    /// Replace the transport with an empty [`FakeTransport`].
    ///
    /// A client already in fake mode keeps its stubs.
    pub fn fake(&mut self) -> &mut Self {
        self.ensure_fake();
        self
    }

    /// Returns `true` if requests are answered by a [`FakeTransport`].
    #[must_use]
    pub const fn is_fake(&self) -> bool {
        self.fake.is_some()
    }

    /// The fake transport, when in fake mode.
    #[must_use]
    pub fn fake_transport(&self) -> Option<&FakeTransport> {
        self.fake.as_deref()
    }

    /// Answer requests for exactly `url` with a canned response.
    ///
    /// Switches to fake mode first if needed.
    pub fn stub_response(
        &mut self,
        url: impl Into<String>,
        body: impl Into<FakeBody>,
        status: u16,
        headers: Headers,
    ) -> &mut Self {
        let response = FakeResponse::new(status, body).with_headers(headers);
        self.ensure_fake().stub_url(url, response);
        self
    }

    /// Answer requests accepted by `matcher` with `response`.
    ///
    /// Switches to fake mode first if needed.
    pub fn stub_with_matcher(
        &mut self,
        matcher: impl RequestMatcher + 'static,
        response: FakeResponse,
    ) -> &mut Self {
        self.ensure_fake().stub(matcher, response);
        self
    }

    fn ensure_fake(&mut self) -> Arc<FakeTransport> {
        if let Some(fake) = &self.fake {
            return Arc::clone(fake);
        }
        let fake = Arc::new(FakeTransport::new());
        self.transport = Arc::clone(&fake) as Arc<dyn Transport>;
        self.fake = Some(Arc::clone(&fake));
        debug!("switched to fake transport");
        fake
    }

    // ========================================================================
    // Recorded exchanges & assertions
    // ========================================================================

    /// Every exchange sent by this client, oldest first.
    #[must_use]
    pub fn recorded(&self) -> Vec<RecordedExchange> {
        self.log.all()
    }

    /// Exchanges accepted by `filter`, oldest first.
    pub fn recorded_matching<F>(&self, filter: F) -> Vec<RecordedExchange>
    where
        F: FnMut(&Request, &Response) -> bool,
    {
        self.log.matching(filter)
    }

    /// Assert that at least one recorded exchange satisfies `predicate`.
    pub fn assert_sent<F>(&self, predicate: F)
    where
        F: FnMut(&Request, &Response) -> bool,
    {
        let passed = !self.log.matching(predicate).is_empty();
        self.report(
            passed,
            format_args!("expected a matching request to have been sent"),
        );
    }

    /// Assert that no recorded exchange satisfies `predicate`.
    pub fn assert_not_sent<F>(&self, predicate: F)
    where
        F: FnMut(&Request, &Response) -> bool,
    {
        let matched = self.log.matching(predicate);
        self.report(
            matched.is_empty(),
            format_args!(
                "expected no matching request, found {}",
                describe(&matched)
            ),
        );
    }

    /// Assert that exactly `expected` exchanges were recorded.
    pub fn assert_sent_count(&self, expected: usize) {
        let actual = self.log.len();
        self.report(
            actual == expected,
            format_args!("expected {expected} requests to have been sent, found {actual}"),
        );
    }

    /// Assert that nothing was sent.
    pub fn assert_nothing_sent(&self) {
        self.report(
            self.log.is_empty(),
            format_args!("expected no requests to have been sent"),
        );
    }

    fn report(&self, passed: bool, message: fmt::Arguments<'_>) {
        let message = if passed {
            message.to_string()
        } else {
            format!("{message}; recorded: {}", describe(&self.log.all()))
        };
        self.reporter.report(passed, &message);
    }
}

/// `[GET https://... -> 200, ...]`
fn describe(exchanges: &[RecordedExchange]) -> String {
    let lines: Vec<String> = exchanges
        .iter()
        .map(|exchange| {
            format!(
                "{} {} -> {}",
                exchange.request().method(),
                exchange.request().url(),
                exchange.response().status()
            )
        })
        .collect();
    format!("[{}]", lines.join(", "))
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`Client`].
///
/// Middleware is applied in registration order: the first added is the
/// outermost and sees the request first.
///
/// # Example
///
/// ```ignore
/// use courier::{Client, SkipLimitPolicy};
/// use std::time::Duration;
///
/// let client = Client::builder()
///     .base_url("https://dummyjson.com")
///     .pagination(SkipLimitPolicy::new())
///     .with_bearer_auth("my-token")
///     .with_logging()
///     .timeout(Duration::from_secs(10))
///     .build()?;
/// ```
#[derive(Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    pagination: Option<Arc<dyn PaginationPolicy>>,
    middleware: Vec<Arc<dyn Middleware>>,
    transport: Option<Arc<dyn Transport>>,
    config: TransportConfigBuilder,
    fake: bool,
    reporter: Option<Arc<dyn FailureReporter>>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("pagination", &self.pagination)
            .field("middleware_count", &self.middleware.len())
            .field("custom_transport", &self.transport.is_some())
            .field("config", &self.config)
            .field("fake", &self.fake)
            .finish_non_exhaustive()
    }
}

impl ClientBuilder {
    // ========================================================================
    // Core Configuration
    // ========================================================================

    /// Prefix for URLs that are not absolute. Concatenated as is.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Attach `policy` to every response.
    #[must_use]
    pub fn pagination(mut self, policy: impl PaginationPolicy + 'static) -> Self {
        self.pagination = Some(Arc::new(policy));
        self
    }

    /// Use a custom transport instead of the network one.
    #[must_use]
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Configure the network transport.
    #[must_use]
    pub fn transport_config(mut self, config: TransportConfig) -> Self {
        self.config = TransportConfig::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_per_host(config.pool_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout);
        self
    }

    /// Set the request timeout of the network transport.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the connection timeout of the network transport.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Start in fake mode, without creating a network transport.
    #[must_use]
    pub fn fake(mut self) -> Self {
        self.fake = true;
        self
    }

    /// Receive assertion outcomes; defaults to [`PanicReporter`].
    #[must_use]
    pub fn reporter(mut self, reporter: impl FailureReporter + 'static) -> Self {
        self.reporter = Some(Arc::new(reporter));
        self
    }

    // ========================================================================
    // Middleware
    // ========================================================================

    /// Append a middleware; the first added is the outermost.
    #[must_use]
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Alias for [`ClientBuilder::middleware`].
    #[must_use]
    pub fn with(self, middleware: impl Middleware + 'static) -> Self {
        self.middleware(middleware)
    }

    /// Add bearer token authentication.
    #[must_use]
    pub fn with_bearer_auth(self, token: impl Into<String>) -> Self {
        self.middleware(BearerAuth::new(token))
    }

    /// Add basic authentication.
    #[must_use]
    pub fn with_basic_auth(self, username: impl AsRef<str>, password: impl AsRef<str>) -> Self {
        self.middleware(BasicAuth::new(username, password))
    }

    /// Add request/response logging.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.middleware(Logging::new())
    }

    /// Add debug-level logging (includes headers and more detail).
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.middleware(Logging::debug())
    }

    /// Add metrics recording through the `metrics` facade.
    #[must_use]
    pub fn with_metrics(self) -> Self {
        self.middleware(Metrics::new())
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if a network transport is needed and cannot be created.
    pub fn build(self) -> Result<Client> {
        let (transport, fake): (Arc<dyn Transport>, _) = if self.fake {
            let fake = Arc::new(FakeTransport::new());
            (Arc::clone(&fake) as Arc<dyn Transport>, Some(fake))
        } else if let Some(transport) = self.transport {
            (transport, None)
        } else {
            let network = HyperTransport::with_config(self.config.build())?;
            (Arc::new(network) as Arc<dyn Transport>, None)
        };

        Ok(Client {
            base_url: self.base_url,
            pagination: self.pagination,
            middleware: MiddlewareChain::new(self.middleware),
            transport,
            fake,
            log: RecordedExchangeLog::new(),
            reporter: self
                .reporter
                .unwrap_or_else(|| Arc::new(PanicReporter) as Arc<dyn FailureReporter>),
        })
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;
    use crate::fake::AnyRequest;

    fn fake_client() -> Client {
        Client::builder()
            .base_url("https://dummyjson.com")
            .fake()
            .build()
            .expect("client")
    }

    #[test]
    fn build_url_prefixes_base() {
        let client = fake_client();
        let url = client
            .build_url(Method::Get, "/products", &[("limit", 25)])
            .expect("url");
        check!(url.as_str() == "https://dummyjson.com/products?limit=25");
    }

    #[test]
    fn build_url_keeps_absolute_urls() {
        let client = fake_client();
        let url = client
            .build_url(Method::Get, "https://api.test/items", &NO_PARAMS)
            .expect("url");
        check!(url.as_str() == "https://api.test/items");
    }

    #[test]
    fn build_url_does_not_normalise_slashes() {
        let client = Client::builder()
            .base_url("https://dummyjson.com/")
            .fake()
            .build()
            .expect("client");
        let url = client
            .build_url(Method::Get, "products", &NO_PARAMS)
            .expect("url");
        check!(url.as_str() == "https://dummyjson.com/products");
    }

    #[test]
    fn build_url_merges_get_params_only() {
        let client = fake_client();
        let get = client
            .build_url(
                Method::Get,
                "/products?limit=10&select=title",
                &json!({"limit": 25, "skip": 5}),
            )
            .expect("url");
        let post = client
            .build_url(Method::Post, "/products?limit=10", &json!({"limit": 25}))
            .expect("url");

        check!(get.query() == Some("select=title&limit=25&skip=5"));
        check!(post.query() == Some("limit=10"));
    }

    #[test]
    fn build_url_without_base_needs_absolute_url() {
        let client = Client::builder().fake().build().expect("client");
        let_assert!(Err(Error::InvalidUrl(_)) = client.build_url(Method::Get, "/products", &NO_PARAMS));
    }

    #[test]
    fn no_params_encodings() {
        check!(to_query_string(&NO_PARAMS).expect("query").is_empty());
        check!(to_json(&NO_PARAMS).expect("json").as_ref() == b"{}");
        check!(to_form(&NO_PARAMS).expect("form").is_empty());
    }

    #[test]
    fn json_sets_headers_and_body() {
        let mut client = fake_client();
        client.stub_with_matcher(AnyRequest, FakeResponse::status(201));

        let response = client
            .post("/products/add", &json!({"title": "Pen"}))
            .expect("response");

        let request = response.request();
        check!(response.status() == 201);
        check!(request.header("content-type") == Some("application/json"));
        check!(request.header("accept") == Some("application/json"));
        check!(request.body().map(AsRef::as_ref) == Some(br#"{"title":"Pen"}"#.as_slice()));
    }

    #[test]
    fn json_get_has_no_body() {
        let mut client = fake_client();
        client.stub_with_matcher(AnyRequest, FakeResponse::json(json!([])));

        let response = client
            .get("/products/search", &[("q", "phone")])
            .expect("response");

        check!(response.request().body().is_none());
        check!(response.request().url().query() == Some("q=phone"));
    }

    #[test]
    fn form_encodes_body() {
        let mut client = fake_client();
        client.stub_with_matcher(AnyRequest, FakeResponse::status(200));

        let response = client
            .form(
                Method::Post,
                "/auth/login",
                &[("username", "emilys"), ("password", "emilyspass")],
            )
            .expect("response");

        let request = response.request();
        check!(request.header("Content-Type") == Some("application/x-www-form-urlencoded"));
        check!(request.body().map(AsRef::as_ref) == Some(b"username=emilys&password=emilyspass".as_slice()));
    }

    #[test]
    fn serialization_failure_sends_nothing() {
        use std::collections::BTreeMap;

        let mut client = fake_client();
        client.stub_with_matcher(AnyRequest, FakeResponse::status(200));
        let mut params = BTreeMap::new();
        params.insert((1, 2), "tuple keys are not JSON");

        let err = client.post("/products/add", &params).expect_err("serialization");

        check!(err.is_serialization());
        client.assert_nothing_sent();
    }

    #[test]
    fn fake_switch_keeps_existing_stubs() {
        let mut client = fake_client();
        client.stub_response("https://dummyjson.com/test", "ok", 200, Headers::new());
        client.fake();

        check!(client.is_fake());
        check!(client.fake_transport().map(FakeTransport::stub_count) == Some(1));
    }

    #[test]
    fn stub_response_switches_to_fake_mode() {
        struct Offline;

        impl Transport for Offline {
            fn send(&self, _request: &Request) -> Result<crate::RawResponse> {
                Err(Error::connection("no network in tests"))
            }
        }

        let mut client = Client::builder()
            .transport(Offline)
            .build()
            .expect("client");
        check!(!client.is_fake());

        client.stub_response(
            "https://dummyjson.com/test",
            json!({"status": "ok"}),
            200,
            Headers::new(),
        );

        check!(client.is_fake());
        let response = client
            .get("https://dummyjson.com/test", &NO_PARAMS)
            .expect("response");
        check!(response.json_path("status") == Some(json!("ok")));
    }

    #[test]
    fn failed_send_is_not_recorded() {
        let client = fake_client();

        let err = client.get("/missing", &NO_PARAMS).expect_err("no stub");

        check!(err.is_no_matching_stub());
        check!(client.recorded().is_empty());
    }

    #[test]
    fn client_is_debug() {
        let client = fake_client();
        let debug = format!("{client:?}");
        check!(debug.contains("Client"));
        check!(debug.contains("dummyjson.com"));
    }
}

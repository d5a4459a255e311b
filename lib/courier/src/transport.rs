//! Network transport using hyper-util.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tokio::runtime::Runtime;
use tracing::{debug, warn};

use crate::{
    Error, Headers, RawResponse, Request, Result, Transport, config::TransportConfig,
    connector::https_connector,
};

/// Blocking [`Transport`] backed by a pooled hyper client.
///
/// The transport owns a small tokio runtime and blocks the calling thread
/// on each exchange. It must therefore not be used, or dropped, from inside
/// another async runtime.
///
/// # Example
///
/// ```ignore
/// use courier::{HyperTransport, Method, Request, Transport};
///
/// let transport = HyperTransport::new()?;
/// let request = Request::new(Method::Get, "https://dummyjson.com/products/1".parse()?);
/// let response = transport.send(&request)?;
/// ```
pub struct HyperTransport {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    runtime: Runtime,
    config: TransportConfig,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a transport with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be started.
    pub fn new() -> Result<Self> {
        Self::with_config(TransportConfig::default())
    }

    /// Create a transport with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be started.
    pub fn with_config(config: TransportConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("courier-transport")
            .enable_all()
            .build()
            .map_err(|err| Error::connection(format!("cannot start runtime: {err}")))?;

        let inner = {
            let _guard = runtime.enter();
            Client::builder(TokioExecutor::new())
                .pool_idle_timeout(config.pool_idle_timeout)
                .pool_max_idle_per_host(config.pool_idle_per_host)
                .build(https_connector(config.connect_timeout))
        };

        Ok(Self {
            inner,
            runtime,
            config,
        })
    }

    /// Get the transport configuration.
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Build a hyper request from a courier request.
    fn build_hyper_request(request: &Request) -> Result<http::Request<Full<Bytes>>> {
        let mut builder = http::Request::builder()
            .method(http::Method::from(request.method()))
            .uri(request.url().as_str());

        for (name, value) in request.headers() {
            builder = builder.header(name, value);
        }

        let body = request.body().cloned().map_or_else(Full::default, Full::new);
        builder
            .body(body)
            .map_err(|e| Error::invalid_request(e.to_string()))
    }

    /// Collect response headers, skipping values that are not valid UTF-8.
    fn extract_headers(headers: &http::HeaderMap) -> Headers {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    async fn execute(&self, request: &Request) -> Result<RawResponse> {
        let hyper_request = Self::build_hyper_request(request)?;

        let exchange = async {
            let response = self
                .inner
                .request(hyper_request)
                .await
                .map_err(Self::map_hyper_error)?;

            let status = response.status().as_u16();
            let headers = Self::extract_headers(response.headers());

            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| Error::connection(e.to_string()))?
                .to_bytes();

            Ok(RawResponse::new(status, headers, body))
        };

        tokio::time::timeout(self.config.timeout, exchange)
            .await
            .map_err(|_| Error::Timeout)?
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let msg = std::error::Error::source(&err)
            .map_or_else(|| err.to_string(), |source| format!("{err}: {source}"));

        if msg.contains("ssl") || msg.contains("tls") || msg.contains("certificate") {
            return Error::tls(msg);
        }

        Error::connection(msg)
    }
}

impl Transport for HyperTransport {
    fn send(&self, request: &Request) -> Result<RawResponse> {
        debug!(method = %request.method(), url = %request.url(), "sending over network");
        let result = self.runtime.block_on(self.execute(request));
        if let Err(err) = &result {
            warn!(method = %request.method(), url = %request.url(), error = %err, "transport failure");
        }
        result
    }
}

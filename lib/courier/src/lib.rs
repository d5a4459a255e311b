//! HTTP API client with middleware, pagination and a fake transport.
//!
//! - [`middleware`] - Request/response interceptors composed into a chain
//! - [`Client`] - Resolves URLs, sends through middleware and transport, records exchanges
//! - [`SkipLimitPolicy`] and [`Pages`] - Lazy multi-page sequences
//! - [`fake`] - Canned responses for tests, no network needed
//!
//! # Example
//!
//! ```ignore
//! use courier::prelude::*;
//! use serde_json::json;
//!
//! let mut client = Client::builder()
//!     .base_url("https://dummyjson.com")
//!     .pagination(SkipLimitPolicy::new())
//!     .with_logging()
//!     .build()?;
//!
//! client.stub_response(
//!     "https://dummyjson.com/products?limit=25",
//!     json!({"products": [], "total": 0, "skip": 0, "limit": 25}),
//!     200,
//!     Headers::new(),
//! );
//!
//! let first = client.get("/products", &[("limit", 25)])?;
//! for page in first.pages(&client) {
//!     let page = page?;
//!     // ...
//! }
//! client.assert_sent(|request, _| request.url().path() == "/products");
//! ```

mod client;
mod config;
mod connector;
pub mod fake;
pub mod middleware;
mod pagination;
pub mod prelude;
mod recorder;
mod transport;

pub use client::{Client, ClientBuilder, NO_PARAMS, NoParams};
pub use config::{TransportConfig, TransportConfigBuilder};
pub use pagination::{Pages, ResponseExt, SkipLimitPolicy};
pub use recorder::{FailureReporter, PanicReporter, RecordedExchange, RecordedExchangeLog};
pub use transport::HyperTransport;

// Re-export core types
pub use courier_core::{
    ContentType, Error, Headers, Method, PaginationPolicy, RawResponse, Request, RequestBuilder,
    Response, Result, Transport, from_json, lookup_path, query, to_form, to_json, to_query_string,
};

// Re-export url for building request URLs
pub use courier_core::{Url, url};

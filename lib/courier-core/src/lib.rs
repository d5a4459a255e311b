//! Core types and traits for the courier HTTP client.
//!
//! This crate provides the foundational types used by courier:
//! - [`Method`] - HTTP method enum
//! - [`Headers`] - Case-insensitive header list
//! - [`Request`] and [`RequestBuilder`] - Immutable HTTP request values
//! - [`RawResponse`] and [`Response`] - Transport-level and paired responses
//! - [`Error`] and [`Result`] - Error handling
//! - [`Transport`] - One request/response exchange, real or fake
//! - [`PaginationPolicy`] - Next-page strategy attached to responses
//! - [`query`] - URL and query-string helpers

mod body;
mod error;
mod headers;
mod method;
mod pagination;
pub mod prelude;
pub mod query;
mod request;
mod response;
mod transport;

pub use body::{ContentType, from_json, to_form, to_json, to_query_string};
pub use error::{Error, Result};
pub use headers::Headers;
pub use method::Method;
pub use pagination::PaginationPolicy;
pub use request::{Request, RequestBuilder};
pub use response::{RawResponse, Response, lookup_path};
pub use transport::Transport;

// Re-export url so callers can build request URLs without a direct dependency
pub use url::{self, Url};

//! Error types for courier.

use derive_more::{Display, Error, From};

use crate::Method;

/// Main error type for courier operations.
///
/// Nothing in courier catches or retries these: every variant surfaces to
/// the caller of `send`, `json`, `form` or the pagination step that hit it.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// The fake transport has no stub for this request.
    #[display("no stub matches {method} {url}")]
    #[from(skip)]
    NoMatchingStub {
        /// Method of the unmatched request.
        method: Method,
        /// URL of the unmatched request.
        #[error(not(source))]
        url: String,
    },

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "user.address.city").
        path: String,
        /// Error message.
        message: String,
    },

    /// Form URL-encoded serialization error.
    #[display("form serialization error: {_0}")]
    #[from(skip)]
    FormSerialization(serde_html_form::ser::Error),

    /// Query string serialization error.
    #[display("query serialization error: {_0}")]
    #[from]
    QuerySerialization(serde_html_form::ser::Error),

    /// The previous page request lacks a query parameter needed to compute the next one.
    #[display("missing pagination parameter '{name}' in previous request")]
    #[from(skip)]
    MissingPaginationParameter {
        /// Query parameter name.
        #[error(not(source))]
        name: String,
    },

    /// A pagination query parameter is present but not a non-negative integer.
    #[display("invalid pagination parameter '{name}': {value}")]
    #[from(skip)]
    InvalidPaginationParameter {
        /// Query parameter name.
        name: String,
        /// Raw value found in the query.
        value: String,
    },
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a no-matching-stub error for the given request line.
    #[must_use]
    pub fn no_matching_stub(method: Method, url: impl Into<String>) -> Self {
        Self::NoMatchingStub {
            method,
            url: url.into(),
        }
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a missing pagination parameter error.
    #[must_use]
    pub fn missing_pagination_parameter(name: impl Into<String>) -> Self {
        Self::MissingPaginationParameter { name: name.into() }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` for failures of the network exchange itself.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Tls(_) | Self::Timeout)
    }

    /// Returns `true` if a body or query string could not be encoded.
    #[must_use]
    pub const fn is_serialization(&self) -> bool {
        matches!(
            self,
            Self::JsonSerialization(_) | Self::FormSerialization(_) | Self::QuerySerialization(_)
        )
    }

    /// Returns `true` if the fake transport had no stub for the request.
    #[must_use]
    pub const fn is_no_matching_stub(&self) -> bool {
        matches!(self, Self::NoMatchingStub { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::Timeout;
        assert_eq!(err.to_string(), "request timeout");

        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "connection error: failed to connect");

        let err = Error::json_deserialization("user.address.city", "missing field `city`");
        assert_eq!(
            err.to_string(),
            "JSON deserialization error at 'user.address.city': missing field `city`"
        );
    }

    #[test]
    fn no_matching_stub_display() {
        let err = Error::no_matching_stub(Method::Get, "https://dummyjson.com/products");
        insta::assert_snapshot!(err, @"no stub matches GET https://dummyjson.com/products");
        assert!(err.is_no_matching_stub());
        assert!(!err.is_transport());
    }

    #[test]
    fn pagination_errors_display() {
        let err = Error::missing_pagination_parameter("limit");
        insta::assert_snapshot!(err, @"missing pagination parameter 'limit' in previous request");

        let err = Error::InvalidPaginationParameter {
            name: "skip".to_string(),
            value: "ten".to_string(),
        };
        insta::assert_snapshot!(err, @"invalid pagination parameter 'skip': ten");
    }

    #[test]
    fn error_is_transport() {
        assert!(Error::Timeout.is_transport());
        assert!(Error::connection("refused").is_transport());
        assert!(Error::tls("bad certificate").is_transport());
        assert!(!Error::invalid_request("bad header").is_transport());
    }

    #[test]
    fn error_is_serialization() {
        // JSON object keys must be strings
        let tuple_keys = std::collections::BTreeMap::from([((1, 2), 3)]);
        let json_err = serde_json::to_vec(&tuple_keys).expect_err("tuple keys");
        assert!(Error::from(json_err).is_serialization());
        assert!(!Error::Timeout.is_serialization());
    }

    #[test]
    fn invalid_url_from_parse_error() {
        let err = Error::from(url::Url::parse("/products").expect_err("relative"));
        assert!(matches!(err, Error::InvalidUrl(_)));
        assert!(err.to_string().starts_with("invalid URL"));
    }
}

//! Body serialization utilities.

use bytes::Bytes;

use crate::Result;

/// Content type for request and response bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// Form URL-encoded content type (`application/x-www-form-urlencoded`).
    FormUrlEncoded,
    /// Plain text content type (`text/plain`).
    PlainText,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::PlainText => "text/plain",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
///
/// # Example
///
/// ```
/// use courier_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct User { name: String }
///
/// let user = User { name: "Alice".to_string() };
/// let bytes = to_json(&user).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"name":"Alice"}"#);
/// ```
pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Serialize a value to a form URL-encoded body.
///
/// # Errors
///
/// Returns an error if the value is not a flat map or struct of scalars
/// and sequences of scalars.
///
/// # Example
///
/// ```
/// use courier_core::to_form;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Login { username: String, password: String }
///
/// let login = Login { username: "alice".to_string(), password: "secret".to_string() };
/// let bytes = to_form(&login).expect("serialize");
/// assert_eq!(bytes.as_ref(), b"username=alice&password=secret");
/// ```
pub fn to_form<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_html_form::to_string(value)
        .map(|s| Bytes::from(s.into_bytes()))
        .map_err(crate::Error::FormSerialization)
}

/// Serialize a value to a query string.
///
/// Uses `serde_html_form` which supports `Vec<T>` for repeated query parameters
/// (e.g., `?tags=a&tags=b&tags=c`).
///
/// # Errors
///
/// Returns an error if query serialization fails.
///
/// # Example
///
/// ```
/// use courier_core::to_query_string;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Search {
///     q: String,
///     #[serde(skip_serializing_if = "Option::is_none")]
///     page: Option<u32>,
/// }
///
/// let search = Search { q: "rust".to_string(), page: Some(1) };
/// let query = to_query_string(&search).expect("serialize");
/// assert_eq!(query, "q=rust&page=1");
/// ```
pub fn to_query_string<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_html_form::to_string(value).map_err(Into::into)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// # Errors
///
/// Returns an error if JSON deserialization fails, with the error message
/// including the path to the problematic field (e.g., "user.address.city").
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn content_type_as_str() {
        assert_eq!(ContentType::Json.as_str(), "application/json");
        assert_eq!(
            ContentType::FormUrlEncoded.as_str(),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(ContentType::PlainText.to_string(), "text/plain");
    }

    #[test]
    fn to_json_from_value() {
        let bytes = to_json(&json!({"title": "iPhone 9"})).expect("serialize");
        assert_eq!(bytes.as_ref(), br#"{"title":"iPhone 9"}"#);
    }

    #[test]
    fn to_form_from_value() {
        // serde_json objects iterate in key order
        let bytes = to_form(&json!({"username": "emilys", "expiresInMins": 30})).expect("form");
        assert_eq!(bytes.as_ref(), b"expiresInMins=30&username=emilys");
    }

    #[test]
    fn to_form_with_vec() {
        #[derive(serde::Serialize)]
        struct Filter {
            category: String,
            tags: Vec<String>,
        }

        let filter = Filter {
            category: "smartphones".to_string(),
            tags: vec!["apple".to_string(), "5g".to_string()],
        };

        let bytes = to_form(&filter).expect("serialize");
        assert_eq!(bytes.as_ref(), b"category=smartphones&tags=apple&tags=5g");
        assert_eq!(
            to_query_string(&filter).expect("query"),
            "category=smartphones&tags=apple&tags=5g"
        );
    }

    #[test]
    fn to_form_error_is_form_serialization() {
        let err = to_form(&json!({"user": {"name": "emilys"}})).expect_err("nested");
        assert!(matches!(err, crate::Error::FormSerialization(_)));
    }

    #[test]
    fn to_form_rejects_nested_values() {
        let err = to_form(&json!({"user": {"name": "emilys"}})).expect_err("nested");
        assert!(err.is_serialization());
    }

    #[test]
    fn to_query_string_from_pairs() {
        let query = to_query_string(&[("limit", "25"), ("skip", "0")]).expect("serialize");
        assert_eq!(query, "limit=25&skip=0");
    }

    #[test]
    fn to_query_string_with_vec() {
        let query = to_query_string(&json!({"select": ["title", "price"]})).expect("serialize");
        assert_eq!(query, "select=title&select=price");
    }

    #[test]
    fn from_json_missing_field_error_with_path() {
        #[derive(Debug, serde::Deserialize)]
        struct Address {
            #[allow(dead_code)]
            city: String,
        }

        #[derive(Debug, serde::Deserialize)]
        struct User {
            #[allow(dead_code)]
            address: Address,
        }

        let result: Result<User> = from_json(br#"{"address":{}}"#);

        let msg = result.expect_err("should fail").to_string();
        assert!(msg.contains("address"), "Expected path 'address' in error: {msg}");
        assert!(msg.contains("city"), "Expected field 'city' mentioned in error: {msg}");
    }
}

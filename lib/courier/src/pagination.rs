//! Pagination over skip/limit APIs.
//!
//! A [`PaginationPolicy`] attached to a client is carried by every
//! [`Response`] it returns. Starting from one response, [`Pages`] lazily
//! fetches the following pages through the same client, so every page is
//! also recorded.
//!
//! ```ignore
//! use courier::{Client, NO_PARAMS, ResponseExt, SkipLimitPolicy};
//!
//! let client = Client::builder()
//!     .base_url("https://dummyjson.com")
//!     .pagination(SkipLimitPolicy::new())
//!     .build()?;
//!
//! let first = client.get("/products?limit=25", &NO_PARAMS)?;
//! for page in first.pages(&client) {
//!     let page = page?;
//!     println!("{}", page.json_or("skip", 0_u64));
//! }
//! ```

use std::iter::FusedIterator;

use serde_json::Value;
use tracing::debug;

use crate::query::{query_value, replace_query_param};
use crate::{Client, Error, PaginationPolicy, Request, Response, Result};

// ============================================================================
// Skip / limit policy
// ============================================================================

/// Offset pagination driven by `total`, `skip` and `limit`.
///
/// The response body reports the three counters; the request query carries
/// `skip` and `limit`. There is another page while `skip + limit < total`.
/// The next request is the previous one with `skip` advanced by `limit`:
/// rewritten in place when present, otherwise placed first, so
/// `?limit=25` becomes `?skip=25&limit=25`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipLimitPolicy {
    total_field: String,
    skip_field: String,
    limit_field: String,
}

impl Default for SkipLimitPolicy {
    fn default() -> Self {
        Self::with_fields("total", "skip", "limit")
    }
}

impl SkipLimitPolicy {
    /// Policy using the `total`, `skip` and `limit` names.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy using custom names.
    ///
    /// `skip` and `limit` name both the body fields and the query parameters.
    #[must_use]
    pub fn with_fields(
        total: impl Into<String>,
        skip: impl Into<String>,
        limit: impl Into<String>,
    ) -> Self {
        Self {
            total_field: total.into(),
            skip_field: skip.into(),
            limit_field: limit.into(),
        }
    }
}

impl PaginationPolicy for SkipLimitPolicy {
    fn has_next_page(&self, response: &Response) -> bool {
        let Ok(body) = response.json_value() else {
            return false;
        };
        let counter = |field: &str| body.get(field).and_then(as_count);
        let counters = (
            counter(&self.total_field),
            counter(&self.skip_field),
            counter(&self.limit_field),
        );
        match counters {
            (Some(total), Some(skip), Some(limit)) => skip.saturating_add(limit) < total,
            _ => false,
        }
    }

    fn next_page_request(&self, response: &Response) -> Result<Request> {
        let previous = response.request();
        let skip = query_counter(previous, &self.skip_field)?.unwrap_or(0);
        let limit = query_counter(previous, &self.limit_field)?
            .ok_or_else(|| Error::missing_pagination_parameter(&self.limit_field))?;

        let next_skip = skip.saturating_add(limit);
        let mut url = previous.url().clone();
        replace_query_param(&mut url, &self.skip_field, &next_skip.to_string());

        debug!(skip = next_skip, limit, url = %url, "next page");
        Ok(previous.clone().with_url(url))
    }
}

/// Query parameter `name` of `request` as a non-negative integer.
fn query_counter(request: &Request, name: &str) -> Result<Option<u64>> {
    let Some(raw) = query_value(request.url(), name) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| Error::InvalidPaginationParameter {
            name: name.to_string(),
            value: raw,
        })
}

/// A non-negative integer, either as a JSON number or a numeric string.
fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

// ============================================================================
// Page iterator
// ============================================================================

#[derive(Debug)]
enum Cursor {
    Start(Response),
    After(Response),
    Done,
}

/// Lazy sequence of pages, starting with the response it was created from.
///
/// Each call to `next` after the first performs one round trip. The
/// sequence ends when the policy reports no further page, when the response
/// carries no policy, or right after yielding an error.
#[derive(Debug)]
pub struct Pages<'c> {
    client: &'c Client,
    cursor: Cursor,
}

impl<'c> Pages<'c> {
    pub(crate) fn new(client: &'c Client, start: Response) -> Self {
        Self {
            client,
            cursor: Cursor::Start(start),
        }
    }
}

impl Iterator for Pages<'_> {
    type Item = Result<Response>;

    fn next(&mut self) -> Option<Self::Item> {
        match std::mem::replace(&mut self.cursor, Cursor::Done) {
            Cursor::Start(response) => {
                self.cursor = Cursor::After(response.clone());
                Some(Ok(response))
            }
            Cursor::After(current) => match self.client.next_page(&current) {
                Ok(Some(page)) => {
                    self.cursor = Cursor::After(page.clone());
                    Some(Ok(page))
                }
                Ok(None) => None,
                Err(err) => Some(Err(err)),
            },
            Cursor::Done => None,
        }
    }
}

impl FusedIterator for Pages<'_> {}

// ============================================================================
// Response delegation
// ============================================================================

/// Pagination steps callable on a [`Response`], given the client to send with.
pub trait ResponseExt {
    /// Lazy page sequence starting with this response.
    fn pages<'c>(&self, client: &'c Client) -> Pages<'c>;

    /// Fetch the page after this one, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the next request cannot be built or sent.
    fn next_page(&self, client: &Client) -> Result<Option<Response>>;

    /// Call `f` on this page and on every following page.
    ///
    /// # Errors
    ///
    /// Returns the first error from a send or from `f`.
    fn for_each_page<F, E>(&self, client: &Client, f: F) -> std::result::Result<(), E>
    where
        F: FnMut(Response) -> std::result::Result<(), E>,
        E: From<Error>;
}

impl ResponseExt for Response {
    fn pages<'c>(&self, client: &'c Client) -> Pages<'c> {
        client.pages(self.clone())
    }

    fn next_page(&self, client: &Client) -> Result<Option<Response>> {
        client.next_page(self)
    }

    fn for_each_page<F, E>(&self, client: &Client, f: F) -> std::result::Result<(), E>
    where
        F: FnMut(Response) -> std::result::Result<(), E>,
        E: From<Error>,
    {
        client.for_each_page(self.clone(), f)
    }
}

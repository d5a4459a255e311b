//! Pagination policy trait.

use std::fmt;

use crate::{Request, Response, Result};

/// Strategy deciding whether, and how, to fetch the page after a response.
///
/// Policies are stateless: both decisions are derived from the completed
/// response and the request that produced it ([`Response::request`]).
///
/// # Example
///
/// ```ignore
/// #[derive(Debug)]
/// struct NextLink;
///
/// impl PaginationPolicy for NextLink {
///     fn has_next_page(&self, response: &Response) -> bool {
///         response.json_path("next").is_some_and(|next| next.is_string())
///     }
///
///     fn next_page_request(&self, response: &Response) -> Result<Request> {
///         let next: String = response.json_or("next", String::new());
///         Ok(response.request().clone().with_url(next.parse()?))
///     }
/// }
/// ```
pub trait PaginationPolicy: fmt::Debug + Send + Sync {
    /// Returns `true` if another page follows `response`.
    fn has_next_page(&self, response: &Response) -> bool;

    /// Builds the request for the page following `response`.
    ///
    /// Only called after [`Self::has_next_page`] returned `true`.
    fn next_page_request(&self, response: &Response) -> Result<Request>;
}

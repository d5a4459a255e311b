//! Prelude module for convenient imports.
//!
//! ```ignore
//! use courier::prelude::*;
//! ```

pub use crate::fake::{AnyRequest, FakeResponse, UrlMatcher};
pub use crate::middleware::{Middleware, Next, from_fn};
pub use crate::{
    Client, ClientBuilder, ContentType, Error, Headers, Method, NO_PARAMS, PaginationPolicy,
    RawResponse, Request, RequestBuilder, Response, ResponseExt, Result, SkipLimitPolicy,
    Transport,
};
pub use serde::{Deserialize, Serialize};

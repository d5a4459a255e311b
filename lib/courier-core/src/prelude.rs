//! Prelude module for convenient imports.
//!
//! ```ignore
//! use courier_core::prelude::*;
//! ```

pub use crate::{
    ContentType, Error, Headers, Method, PaginationPolicy, RawResponse, Request, RequestBuilder,
    Response, Result, Transport, from_json, to_form, to_json,
};

//! Common utilities for httpsource
//!
//! Shared HTTP vocabulary used by the executor and its callers.

pub mod http;

pub use http::{HttpMethod, HttpResponseLike, HttpStatus};

//! httpsource: One-shot HTTP(S) data source executor
//!
//! Performs a single request described by plain input attributes and returns
//! the response as text, with optional mutual TLS, custom trust anchors and
//! server-name overrides.
//!
//! # Architecture
//!
//! This crate provides the data source functionality:
//! - `HttpClient`: Orchestrator building a fresh transport per invocation
//! - `RequestSpec`: Method resolution, header validation and body encoding
//! - `TlsMaterial`: PEM material turned into a per-request `rustls` config
//! - `ResponseResult`: Status classification, header joining and warnings
//!
//! The command-line front end lives in the `httpsource-cli` crate.

pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod tls;

pub use client::HttpClient;
pub use config::{DataSourceConfig, HttpClientConfig};
pub use error::{HttpError, HttpErrorCategory, HttpResult};
pub use request::{HttpMethod, PreparedRequest, RequestBody, RequestSpec};
pub use response::{Attributes, ResponseResult, Warning};
pub use tls::TlsMaterial;

// Re-export shared HTTP types from httpsource-common
pub use httpsource_common::http::{HttpResponseLike, HttpStatus};

// Callers pass this to `HttpClient::execute_with_cancel`
pub use tokio_util::sync::CancellationToken;

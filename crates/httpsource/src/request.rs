//! HTTP request types and builders

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use url::Url;

use crate::error::{HttpError, HttpResult};
use crate::tls::TlsMaterial;

pub use httpsource_common::http::HttpMethod;

/// Key of a legacy field-map body whose value is sent raw as form data
pub const FORM_BODY_KEY: &str = "body";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Convert HttpMethod to reqwest Method
fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Head => reqwest::Method::HEAD,
    }
}

/// Request body as supplied by the caller
///
/// Deserializes from either a string or a string map, so configuration files
/// can use both conventions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RequestBody {
    /// Pre-encoded payload, sent byte-for-byte
    Text(String),
    /// Legacy key/value body, encoded according to the content type
    Fields(BTreeMap<String, String>),
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        match self {
            RequestBody::Text(text) => text.is_empty(),
            RequestBody::Fields(fields) => fields.is_empty(),
        }
    }
}

/// Input of one data source invocation
#[derive(Debug, Clone)]
pub struct RequestSpec {
    /// Absolute http(s) URL
    pub url: String,
    /// Explicit method; resolved from the body when unset
    pub method: Option<String>,
    /// Request headers, applied verbatim
    pub headers: BTreeMap<String, String>,
    pub body: Option<RequestBody>,
    pub tls: TlsMaterial,
    /// Deadline for the whole exchange, body included
    pub timeout: Option<Duration>,
}

impl RequestSpec {
    /// Create a new request spec
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: None,
            headers: BTreeMap::new(),
            body: None,
            tls: TlsMaterial::default(),
            timeout: None,
        }
    }

    /// Set an explicit method
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add multiple headers
    pub fn headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Set a pre-encoded body
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(body.into()));
        self
    }

    /// Set a legacy field-map body
    pub fn fields(mut self, fields: BTreeMap<String, String>) -> Self {
        self.body = Some(RequestBody::Fields(fields));
        self
    }

    /// Set TLS material
    pub fn tls(mut self, tls: TlsMaterial) -> Self {
        self.tls = tls;
        self
    }

    /// Set the deadline
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the deadline in milliseconds
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout = Some(Duration::from_millis(ms));
        self
    }

    fn has_body(&self) -> bool {
        self.body.as_ref().is_some_and(|b| !b.is_empty())
    }

    /// Explicit method if given, otherwise POST with a body and GET without.
    pub fn resolve_method(&self) -> HttpResult<HttpMethod> {
        match self.method.as_deref() {
            Some(method) => {
                HttpMethod::from_str(method).map_err(|e| HttpError::config("method", e))
            }
            None if self.has_body() => Ok(HttpMethod::Post),
            None => Ok(HttpMethod::Get),
        }
    }

    /// Case-insensitive lookup of the declared content type
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.as_str())
    }

    /// Validate the spec and produce a ready-to-send request.
    pub fn prepare(&self) -> HttpResult<PreparedRequest> {
        let url = Url::parse(&self.url).map_err(|e| HttpError::config("url", e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(HttpError::config(
                "url",
                format!("unsupported scheme {:?}", url.scheme()),
            ));
        }

        let method = self.resolve_method()?;

        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                HttpError::config("request_headers", format!("{:?}: {}", name, e))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                HttpError::config("request_headers", format!("value of {:?}: {}", name, e))
            })?;
            headers.insert(header_name, header_value);
        }

        let body = match &self.body {
            None => None,
            Some(body) if body.is_empty() => None,
            Some(RequestBody::Text(text)) => Some(text.clone().into_bytes()),
            Some(RequestBody::Fields(fields)) => encode_fields(fields, self.content_type())?,
        };

        tracing::debug!(
            url = %url,
            method = %method,
            headers = headers.len(),
            body_len = body.as_ref().map_or(0, Vec::len),
            "prepared request"
        );

        Ok(PreparedRequest {
            method,
            url,
            headers,
            body,
        })
    }
}

/// Encode a legacy field-map body for the declared content type.
///
/// Content types other than JSON and form data leave the request without a
/// body.
fn encode_fields(
    fields: &BTreeMap<String, String>,
    content_type: Option<&str>,
) -> HttpResult<Option<Vec<u8>>> {
    let content_type = content_type.map(str::to_ascii_lowercase);
    match content_type.as_deref() {
        Some(ct) if ct.contains(FORM_CONTENT_TYPE) => Ok(Some(
            fields
                .get(FORM_BODY_KEY)
                .cloned()
                .unwrap_or_default()
                .into_bytes(),
        )),
        Some(ct) if ct.contains(JSON_CONTENT_TYPE) => encode_json(fields).map(Some),
        Some(ct) => {
            tracing::warn!(
                content_type = ct,
                "request_body map is only encoded for JSON or form content types; sending no body"
            );
            Ok(None)
        }
        None => encode_json(fields).map(Some),
    }
}

fn encode_json(fields: &BTreeMap<String, String>) -> HttpResult<Vec<u8>> {
    serde_json::to_vec(fields)
        .map_err(|e| HttpError::config("request_body", format!("Error marshalling JSON request: {}", e)))
}

/// A validated request, ready for the transport
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl PreparedRequest {
    /// Build a reqwest RequestBuilder from the prepared data
    pub(crate) fn build_reqwest(self, client: &reqwest::Client) -> reqwest::RequestBuilder {
        let builder = client
            .request(to_reqwest_method(self.method), self.url)
            .headers(self.headers);

        match self.body {
            Some(body) => builder.body(body),
            None => builder,
        }
    }
}

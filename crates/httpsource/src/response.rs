//! HTTP response types and classification

use std::collections::BTreeMap;

use http::header::{HeaderMap, CONTENT_TYPE};
use serde::Serialize;

use crate::error::{HttpError, HttpResult};
use httpsource_common::http::{HttpResponseLike, HttpStatus};

/// Non-fatal diagnostic attached to a successful result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub summary: String,
    pub detail: String,
}

impl Warning {
    fn binary_content(content_type: &str) -> Self {
        Self {
            summary: format!(
                "Content-Type is not recognized as a text type, got {:?}",
                content_type
            ),
            detail: "If the content is binary data, the consumer may not properly handle \
                     the contents of the response."
                .to_string(),
        }
    }
}

/// Output of one data source invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseResult {
    /// Identity of the result: the request URL
    pub id: String,
    pub status_code: u16,
    /// Response payload as text
    pub body: String,
    /// One value per header name, repeated values joined with `", "`
    pub headers: BTreeMap<String, String>,
    pub warnings: Vec<Warning>,
}

impl ResponseResult {
    /// Alias of `body`, kept for consumers that read `response_body`
    pub fn response_body(&self) -> &str {
        &self.body
    }

    /// The output attributes as exposed to the configuration consumer
    pub fn attributes(&self) -> Attributes<'_> {
        Attributes {
            id: &self.id,
            status_code: self.status_code,
            body: &self.body,
            response_body: &self.body,
            response_headers: &self.headers,
            warnings: &self.warnings,
        }
    }
}

impl HttpResponseLike for ResponseResult {
    fn status_code(&self) -> u16 {
        self.status_code
    }

    fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }
}

/// Serializable view of a [`ResponseResult`]
#[derive(Debug, Serialize)]
pub struct Attributes<'a> {
    pub id: &'a str,
    pub status_code: u16,
    pub body: &'a str,
    pub response_body: &'a str,
    pub response_headers: &'a BTreeMap<String, String>,
    pub warnings: &'a [Warning],
}

/// Whether a Content-Type can be handled as text.
///
/// Accepts `text/*`, `application/json` and `application/samlmetadata+xml`
/// with no charset, UTF-8 or US-ASCII.
pub fn is_content_type_text(content_type: &str) -> bool {
    let Some(Ok(parsed)) = normalize_media_type(content_type).map(|ct| ct.parse::<mime::Mime>())
    else {
        return false;
    };

    let essence = parsed.essence_str().to_ascii_lowercase();
    let allowed = essence.starts_with("text/")
        || essence == "application/json"
        || essence.starts_with("application/samlmetadata+xml");
    if !allowed {
        return false;
    }

    match parsed.get_param(mime::CHARSET) {
        None => true,
        Some(charset) => {
            let charset = charset.as_str().trim_matches('"').to_ascii_lowercase();
            charset.is_empty() || charset == "utf-8" || charset == "us-ascii"
        }
    }
}

/// Trim whitespace around `;` separators and drop a quoted empty charset,
/// which `mime` refuses but counts as no charset here. A parameter without a
/// value makes the whole media type invalid.
fn normalize_media_type(content_type: &str) -> Option<String> {
    let mut parts = content_type.split(';').map(str::trim);
    let mut normalized = parts.next().unwrap_or_default().to_string();
    for param in parts.filter(|p| !p.is_empty()) {
        let (name, value) = param.split_once('=')?;
        let (name, value) = (name.trim(), value.trim());
        if value.is_empty() {
            return None;
        }
        if name.eq_ignore_ascii_case("charset") && value == "\"\"" {
            continue;
        }
        normalized.push_str("; ");
        normalized.push_str(name);
        normalized.push('=');
        normalized.push_str(value);
    }
    Some(normalized)
}

/// Canonical MIME form of a header name (`x-double` -> `X-Double`).
pub fn canonical_header_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }
    out
}

/// Collapse repeated headers into one value per name, in receipt order.
pub fn join_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut joined = BTreeMap::new();
    for name in headers.keys() {
        let values: Vec<String> = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect();
        joined.insert(canonical_header_name(name.as_str()), values.join(", "));
    }
    joined
}

/// Classify a fully received response.
///
/// `body` is `None` when reading the payload failed; that only matters for
/// error statuses, where the message then omits the body.
pub fn classify(
    id: impl Into<String>,
    status_code: u16,
    headers: &HeaderMap,
    body: Option<&[u8]>,
) -> HttpResult<ResponseResult> {
    if !HttpStatus(status_code).is_success() {
        let body = body
            .filter(|b| !b.is_empty())
            .map(|b| String::from_utf8_lossy(b).into_owned());
        return Err(HttpError::Status {
            code: status_code,
            body,
        });
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default();

    let mut warnings = Vec::new();
    if content_type.is_empty() || !is_content_type_text(&content_type) {
        tracing::warn!(content_type = %content_type, "response content type is not text");
        warnings.push(Warning::binary_content(&content_type));
    }

    Ok(ResponseResult {
        id: id.into(),
        status_code,
        body: String::from_utf8_lossy(body.unwrap_or_default()).into_owned(),
        headers: join_headers(headers),
        warnings,
    })
}

/// Read a reqwest Response to the end and classify it
pub async fn from_reqwest(response: reqwest::Response, id: String) -> HttpResult<ResponseResult> {
    let status_code = response.status().as_u16();
    let headers = response.headers().clone();

    match response.bytes().await {
        Ok(body) => classify(id, status_code, &headers, Some(&body)),
        Err(err) if HttpStatus(status_code).is_success() => Err(HttpError::from_reqwest(err)),
        Err(err) => {
            tracing::debug!(error = %err, status_code, "could not read error response body");
            classify(id, status_code, &headers, None)
        }
    }
}

//! Shared HTTP types for the httpsource crates.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// HTTP request methods accepted by the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    /// Every accepted method, in documentation order.
    pub const ALL: [HttpMethod; 6] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
        Self::Head,
    ];

    /// Returns the method as a string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    /// Parses a method name. Matching is exact: configuration values are
    /// upper-case verbs and anything else is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "expected one of GET, POST, PUT, PATCH, DELETE, HEAD, got {:?}",
                    s
                )
            })
    }
}

/// HTTP status code wrapper with helper methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HttpStatus(pub u16);

impl HttpStatus {
    pub const OK: Self = Self(200);
    pub const NO_CONTENT: Self = Self(204);
    pub const NOT_FOUND: Self = Self(404);
    pub const INTERNAL_SERVER_ERROR: Self = Self(500);

    /// Returns the status code as u16.
    pub fn code(&self) -> u16 {
        self.0
    }

    /// Returns true if this is a success status (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }

    /// Returns true if this is a client error status (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.0)
    }

    /// Returns true if this is a server error status (5xx).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.0)
    }

    /// Returns true if this is a redirect status (3xx).
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.0)
    }
}

impl From<u16> for HttpStatus {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl From<HttpStatus> for u16 {
    fn from(status: HttpStatus) -> Self {
        status.0
    }
}

/// Trait for types that represent a received HTTP response.
pub trait HttpResponseLike {
    /// Returns the HTTP status code.
    fn status_code(&self) -> u16;

    /// Returns the response headers, one joined value per name.
    fn headers(&self) -> &BTreeMap<String, String>;

    /// Returns the HTTP status.
    fn status(&self) -> HttpStatus {
        HttpStatus(self.status_code())
    }

    /// Returns true if this is a success response (2xx).
    fn is_success(&self) -> bool {
        self.status().is_success()
    }

    /// Gets a header value by name (case-insensitive).
    fn header(&self, name: &str) -> Option<&str> {
        self.headers()
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the Content-Type header value.
    fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

//! Transport configuration and data source input attributes

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::request::{RequestBody, RequestSpec};
use crate::tls::TlsMaterial;

/// Configuration for the per-invocation HTTP transport
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Connection timeout (DNS + TCP + TLS)
    pub connect_timeout: Option<Duration>,

    /// Deadline applied when a request does not carry its own
    pub default_timeout: Option<Duration>,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    /// Maximum number of redirects to follow
    pub max_redirects: usize,

    /// User-Agent header value
    pub user_agent: String,

    /// Enable transparent gzip decompression
    pub gzip: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            default_timeout: None,
            follow_redirects: true,
            max_redirects: 10,
            user_agent: format!("httpsource/{}", env!("CARGO_PKG_VERSION")),
            gzip: true,
        }
    }
}

impl HttpClientConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the fallback deadline
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Set whether to follow redirects
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    /// Set maximum redirects
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Enable/disable gzip decompression
    pub fn gzip(mut self, enabled: bool) -> Self {
        self.gzip = enabled;
        self
    }
}

/// Input attributes of the data source, as written in configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataSourceConfig {
    pub url: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub request_headers: BTreeMap<String, String>,
    #[serde(default)]
    pub request_body: Option<RequestBody>,
    #[serde(default)]
    pub ca: Option<String>,
    #[serde(default)]
    pub client_crt: Option<String>,
    #[serde(default)]
    pub client_key: Option<String>,
    #[serde(default)]
    pub sni: Option<String>,
    #[serde(default)]
    pub insecure_skip_verify: bool,
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

impl DataSourceConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Convert the attributes into a request spec
    pub fn into_request_spec(self) -> RequestSpec {
        let tls = TlsMaterial {
            ca: self.ca,
            client_cert: self.client_crt,
            client_key: self.client_key,
            sni: self.sni,
            insecure_skip_verify: self.insecure_skip_verify,
        };

        RequestSpec {
            url: self.url,
            method: self.method,
            headers: self.request_headers,
            body: self.request_body,
            tls,
            timeout: self.request_timeout_ms.map(Duration::from_millis),
        }
    }
}

//! Data source orchestrator: one fresh transport per invocation

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::HeaderValue;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::HttpClientConfig;
use crate::error::{HttpError, HttpResult};
use crate::request::RequestSpec;
use crate::response::{from_reqwest, ResponseResult};
use crate::tls::{self, TlsMaterial};

/// Executes data source requests
///
/// The client itself only holds configuration. Each call to [`execute`]
/// builds its own `reqwest::Client` with pooling and environment proxies
/// disabled, so TLS material never leaks between invocations.
///
/// # Example
///
/// ```ignore
/// use httpsource::{HttpClient, RequestSpec};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = HttpClient::default();
///     let result = client
///         .execute(RequestSpec::new("https://example.com/meta.txt").timeout_ms(5_000))
///         .await?;
///     println!("{} {}", result.status_code, result.body);
///     Ok(())
/// }
/// ```
///
/// [`execute`]: HttpClient::execute
#[derive(Clone)]
pub struct HttpClient {
    config: Arc<HttpClientConfig>,
}

impl HttpClient {
    /// Create a new client with the given configuration
    pub fn new(config: HttpClientConfig) -> HttpResult<Self> {
        HeaderValue::from_str(&config.user_agent)
            .map_err(|e| HttpError::config("user_agent", e.to_string()))?;

        Ok(Self {
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Run one invocation to completion
    pub async fn execute(&self, spec: RequestSpec) -> HttpResult<ResponseResult> {
        self.execute_with_cancel(spec, CancellationToken::new()).await
    }

    /// Run one invocation, aborting with [`HttpError::Cancelled`] when
    /// `cancel` fires before the response body has been read.
    pub async fn execute_with_cancel(
        &self,
        spec: RequestSpec,
        cancel: CancellationToken,
    ) -> HttpResult<ResponseResult> {
        let start = Instant::now();
        let id = spec.url.clone();

        let prepared = spec.prepare()?;
        let transport = self.transport(&spec.tls)?;

        let method = prepared.method;
        let url = display_url(&prepared.url);
        let deadline = spec.timeout.or(self.config.default_timeout);

        let exchange = async move {
            let response = prepared
                .build_reqwest(&transport)
                .send()
                .await
                .map_err(HttpError::from_reqwest)?;
            from_reqwest(response, id).await
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(HttpError::Cancelled),
            result = with_deadline(deadline, exchange) => result,
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(response) => tracing::info!(
                url = %url,
                method = %method,
                status_code = response.status_code,
                warnings = response.warnings.len(),
                elapsed_ms,
                "data source request completed"
            ),
            Err(err) => tracing::warn!(
                url = %url,
                method = %method,
                category = ?err.category(),
                elapsed_ms,
                error = %err.sanitized_message(),
                "data source request failed"
            ),
        }

        result
    }

    /// Build the per-invocation transport.
    fn transport(&self, material: &TlsMaterial) -> HttpResult<reqwest::Client> {
        let config = &self.config;

        let mut builder = reqwest::Client::builder()
            .no_proxy()
            .pool_max_idle_per_host(0)
            .user_agent(config.user_agent.as_str())
            .gzip(config.gzip);

        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        // Configure redirects
        if config.follow_redirects {
            builder = builder.redirect(reqwest::redirect::Policy::limited(config.max_redirects));
        } else {
            builder = builder.redirect(reqwest::redirect::Policy::none());
        }

        if !material.is_empty() {
            builder = builder.use_preconfigured_tls(tls::client_config(material)?);
        }

        builder.build().map_err(HttpError::from_reqwest)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self {
            config: Arc::new(HttpClientConfig::default()),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("user_agent", &self.config.user_agent)
            .field("default_timeout", &self.config.default_timeout)
            .field("follow_redirects", &self.config.follow_redirects)
            .finish()
    }
}

async fn with_deadline<F>(deadline: Option<Duration>, exchange: F) -> HttpResult<ResponseResult>
where
    F: Future<Output = HttpResult<ResponseResult>>,
{
    match deadline {
        Some(deadline) => tokio::time::timeout(deadline, exchange)
            .await
            .unwrap_or_else(|_| {
                Err(HttpError::Timeout(format!(
                    "context deadline exceeded after {}ms",
                    deadline.as_millis()
                )))
            }),
        None => exchange.await,
    }
}

/// URL for log output, without credentials
fn display_url(url: &Url) -> String {
    let mut url = url.clone();
    let _ = url.set_password(None);
    let _ = url.set_username("");
    url.to_string()
}

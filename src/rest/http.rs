use crate::error::CopyFactoryError;
use crate::types::ErrorResponse;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Method, Proxy, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::time::SystemTime;
use tokio::time::{Duration, sleep};
use tracing::warn;
use url::Url;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Retry policy for transient failures.
///
/// Conflict, internal, generic API and timeout failures are retried; every
/// other failure is returned on first occurrence.
///
/// # Default
///
/// - `retries = 5` (attempts after the initial request)
/// - `min_delay = 1s`, `max_delay = 30s`
/// - Delay before retry `n` (zero-based) is `min(2^n * min_delay, max_delay)`
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum retries after the initial attempt.
    pub retries: u32,
    /// Delay before the first retry.
    pub min_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: 5,
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Delay to wait after failed attempt `attempt` (zero-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.min_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

/// Description of one HTTP call. Rebuilt into a fresh request for every attempt.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Overrides the client-wide timeout for this call.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, CopyFactoryError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

pub(crate) fn build_http_error(
    status: StatusCode,
    bytes: &[u8],
    retry_after: Option<Duration>,
) -> CopyFactoryError {
    let body = serde_json::from_slice::<ErrorResponse>(bytes).unwrap_or_default();
    let message = body
        .message
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());

    match status {
        StatusCode::BAD_REQUEST => CopyFactoryError::Validation {
            message,
            details: body.details,
        },
        StatusCode::UNAUTHORIZED => CopyFactoryError::Unauthorized { message },
        StatusCode::FORBIDDEN => CopyFactoryError::Forbidden { message },
        StatusCode::NOT_FOUND => CopyFactoryError::NotFound { message },
        StatusCode::CONFLICT => CopyFactoryError::Conflict { message },
        StatusCode::TOO_MANY_REQUESTS => CopyFactoryError::TooManyRequests {
            message,
            metadata: body.metadata,
            retry_after,
        },
        StatusCode::INTERNAL_SERVER_ERROR => CopyFactoryError::Internal { message },
        status => CopyFactoryError::Api { status, message },
    }
}

/// Server-requested wait carried by a 429 response.
///
/// Accepts delta-seconds or an HTTP date; a date already in the past yields zero.
fn retry_after_delay(status: StatusCode, headers: &HeaderMap) -> Option<Duration> {
    if status != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }
    let text = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    match text.parse::<u64>() {
        Ok(seconds) => Some(Duration::from_secs(seconds)),
        Err(_) => {
            let at = httpdate::parse_http_date(text).ok()?;
            Some(at.duration_since(SystemTime::now()).unwrap_or(Duration::ZERO))
        }
    }
}

/// Options used to assemble the underlying `reqwest::Client`.
#[derive(Debug, Clone)]
struct TransportOptions {
    timeout: Duration,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
    default_headers: HeaderMap,
    proxy: Option<Proxy>,
}

impl TransportOptions {
    fn into_client(self) -> Result<Client, CopyFactoryError> {
        let mut builder = Client::builder()
            .timeout(self.timeout)
            .default_headers(self.default_headers);
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }
        if let Some(proxy) = self.proxy {
            builder = builder.proxy(proxy);
        }
        Ok(builder.build()?)
    }
}

/// Builder for [`HttpClient`] with transport and retry customization.
#[derive(Debug, Clone)]
pub struct HttpClientBuilder {
    retry_config: RetryConfig,
    transport: TransportOptions,
    prebuilt: Option<Client>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            retry_config: RetryConfig::default(),
            transport: TransportOptions {
                timeout: DEFAULT_REQUEST_TIMEOUT,
                connect_timeout: None,
                user_agent: None,
                default_headers: HeaderMap::new(),
                proxy: None,
            },
            prebuilt: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Client-wide timeout. Long-poll calls override it per request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.transport.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.transport.connect_timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.transport.user_agent = Some(user_agent.into());
        self
    }

    /// Headers sent with every request, merged over earlier ones of the same name.
    pub fn with_default_headers(mut self, headers: HeaderMap) -> Self {
        self.transport.default_headers.extend(headers);
        self
    }

    pub fn with_proxy(mut self, proxy: Proxy) -> Self {
        self.transport.proxy = Some(proxy);
        self
    }

    /// Use a preconfigured `reqwest::Client`; the transport options are then ignored.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.prebuilt = Some(client);
        self
    }

    pub fn build(self) -> Result<HttpClient, CopyFactoryError> {
        let http = match self.prebuilt {
            Some(client) => client,
            None => self.transport.into_client()?,
        };
        Ok(HttpClient {
            http,
            retry_config: self.retry_config,
        })
    }
}

/// HTTP client that classifies failures and retries transient ones.
///
/// Retry counters are local to each call; the client holds no mutable state
/// and is cheap to clone.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: Client,
    retry_config: RetryConfig,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn new() -> Self {
        Self::builder()
            .build()
            .expect("default http client builder should not fail")
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }

    /// Perform the request, retrying transient failures per [`RetryConfig`].
    ///
    /// A 2xx response body is parsed as JSON; an empty body is parsed as
    /// `null`, so `()`, `Option<_>` and [`serde::de::IgnoredAny`] all accept it.
    pub async fn request<T>(&self, options: &RequestOptions) -> Result<T, CopyFactoryError>
    where
        T: DeserializeOwned,
    {
        let mut attempt: u32 = 0;

        loop {
            match self.execute(options).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.retry_config.retries => {
                    let delay = self.retry_config.backoff_delay(attempt);
                    warn!(
                        method = %options.method,
                        url = %options.url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "request failed, retrying"
                    );
                    if !delay.is_zero() {
                        sleep(delay).await;
                    }
                    attempt = attempt.saturating_add(1);
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn execute<T>(&self, options: &RequestOptions) -> Result<T, CopyFactoryError>
    where
        T: DeserializeOwned,
    {
        let mut req = self
            .http
            .request(options.method.clone(), options.url.clone())
            .headers(options.headers.clone());

        if !options.query.is_empty() {
            req = req.query(&options.query);
        }
        if let Some(body) = &options.body {
            req = req.json(body);
        }
        if let Some(timeout) = options.timeout {
            req = req.timeout(timeout);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let retry_after = retry_after_delay(status, resp.headers());
        let bytes = resp.bytes().await?;

        if status.is_success() {
            let body_bytes: &[u8] = if bytes.is_empty() { b"null" } else { bytes.as_ref() };
            return Ok(serde_json::from_slice::<T>(body_bytes)?);
        }

        Err(build_http_error(status, &bytes, retry_after))
    }
}

use std::time::Duration;

use ledgerbridge_domain::constants::{DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use ledgerbridge_domain::LedgerBridgeError;
use reqwest::{Client as ReqwestClient, Method, Request, RequestBuilder, Response};
use tracing::{debug, warn};

/// Attempt budget and backoff for idempotent requests.
///
/// Non-idempotent requests (token exchange, contact and invoice creation,
/// attachment upload) always get a single attempt: a 5xx on create may still
/// have created the record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_backoff: Duration::from_millis(200) }
    }
}

impl RetryPolicy {
    fn attempts_for(&self, method: &Method) -> usize {
        if method.is_idempotent() {
            self.max_attempts.max(1)
        } else {
            1
        }
    }

    /// Delay before retry `n` (1-based): `base * 2^(n-1)`, capped at 2^8.
    fn delay(&self, retry: usize) -> Duration {
        let exponent = u32::try_from(retry.saturating_sub(1).min(8)).unwrap_or(8);
        self.base_backoff.saturating_mul(1 << exponent)
    }
}

/// Shared reqwest wrapper used by the OAuth client and the Xero adapter.
#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: ReqwestClient,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Client with default timeout and retry policy.
    pub fn new() -> Result<Self, LedgerBridgeError> {
        Self::builder().build()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.inner.request(method, url)
    }

    /// Send a request, retrying idempotent ones on 5xx and transient
    /// transport failures. Any response that is not retried is returned as
    /// is; status handling belongs to the caller. Streaming bodies cannot be
    /// cloned and get one attempt.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, LedgerBridgeError> {
        let mut request = builder.build().map_err(map_transport_error)?;
        let attempts = self.retry.attempts_for(request.method());
        let mut attempt = 1;

        loop {
            let spare = if attempt < attempts { request.try_clone() } else { None };
            let outcome = self.execute(request, attempt).await;
            let retryable = match &outcome {
                Ok(response) => response.status().is_server_error(),
                Err(err) => is_transient(err),
            };

            match spare {
                Some(next) if retryable => {
                    let delay = self.retry.delay(attempt);
                    warn!(attempt, ?delay, "retrying idempotent HTTP request");
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                    request = next;
                }
                _ => return outcome.map_err(map_transport_error),
            }
        }
    }

    async fn execute(&self, request: Request, attempt: usize) -> Result<Response, reqwest::Error> {
        let method = request.method().clone();
        let url = request.url().clone();
        let result = self.inner.execute(request).await;
        match &result {
            Ok(response) => {
                debug!(attempt, %method, %url, status = %response.status(), "HTTP response");
            }
            Err(err) => debug!(attempt, %method, %url, error = %err, "HTTP transport failure"),
        }
        result
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    retry: RetryPolicy,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpClientBuilder {
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts (first try plus retries) for idempotent requests.
    #[must_use]
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.retry.max_attempts = attempts.max(1);
        self
    }

    #[must_use]
    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.retry.base_backoff = backoff;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn build(self) -> Result<HttpClient, LedgerBridgeError> {
        let inner = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .no_proxy()
            .build()
            .map_err(map_transport_error)?;

        Ok(HttpClient { inner, retry: self.retry })
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

/// Map a transport-level reqwest failure into the domain error.
pub fn map_transport_error(err: reqwest::Error) -> LedgerBridgeError {
    if err.is_timeout() {
        LedgerBridgeError::Network(format!("request timed out: {err}"))
    } else if err.is_connect() {
        LedgerBridgeError::Network(format!("could not connect: {err}"))
    } else if err.is_builder() {
        LedgerBridgeError::InvalidInput(format!("malformed request: {err}"))
    } else if err.is_decode() {
        LedgerBridgeError::InvalidResponse(err.to_string())
    } else {
        LedgerBridgeError::Network(err.to_string())
    }
}

/// Read a non-success response body for error reporting.
///
/// The raw text is kept verbatim; remote validation messages live there.
pub async fn read_error_body(response: Response) -> String {
    response.text().await.unwrap_or_else(|err| format!("<unreadable body: {err}>"))
}

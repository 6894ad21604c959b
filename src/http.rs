//! Request/response HTTP client with a bounded retry policy.
//!
//! DESIGN
//! ======
//! One request per call, rebuilt from scratch on every attempt: 3 attempts
//! total with a fixed 1 second delay in between. Exhausted retries and
//! malformed URLs surface as `None`, never as an error crossing the public
//! session API; the transport error detail goes to tracing instead.
//!
//! The [`HttpTransport`] trait is the seam between the retry policy and
//! reqwest so the policy can be exercised against scripted fakes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE, HeaderValue};
use tracing::{debug, warn};

const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("http client build failed: {0}")]
    ClientBuild(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("http status {0}")]
    Status(u16),
    #[error("invalid cookie header")]
    InvalidCookies,
    #[error("missing response header: {0}")]
    MissingHeader(&'static str),
}

/// What to read back from the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Fire-and-forget: succeed on transport success, return an empty string.
    Discard,
    /// Read the full response body as text.
    Body,
    /// Read every value of one named response header, newline-joined.
    /// Used once per session to harvest the `set-cookie` values.
    Header(&'static str),
}

/// One outbound request. `body` present means POST, absent means GET.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub body: Option<String>,
    pub cookies: Option<String>,
    pub mode: ResponseMode,
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue the request once. Implementations must not retry internally.
    async fn execute(&self, request: &HttpRequest) -> Result<String, TransportError>;
}

// =============================================================================
// REQWEST TRANSPORT
// =============================================================================

/// The production transport. Builds a fresh reqwest request per attempt;
/// connections are pooled by reqwest but request objects are never reused.
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|error| TransportError::ClientBuild(error.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<String, TransportError> {
        let mut builder = if let Some(body) = &request.body {
            self.http
                .post(&request.url)
                .header(CONTENT_TYPE, "application/json; charset=UTF-8")
                .header(ACCEPT, "application/json")
                .body(body.clone())
        } else {
            self.http.get(&request.url)
        };

        if let Some(cookies) = &request.cookies {
            let value =
                HeaderValue::from_str(cookies).map_err(|_| TransportError::InvalidCookies)?;
            builder = builder.header(COOKIE, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|error| TransportError::Request(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        match request.mode {
            ResponseMode::Discard => Ok(String::new()),
            ResponseMode::Header(name) => {
                let values: Vec<&str> = response
                    .headers()
                    .get_all(name)
                    .iter()
                    .filter_map(|value| value.to_str().ok())
                    .collect();
                if values.is_empty() {
                    return Err(TransportError::MissingHeader(name));
                }
                Ok(values.join("\n"))
            }
            ResponseMode::Body => response
                .text()
                .await
                .map_err(|error| TransportError::Request(error.to_string())),
        }
    }
}

// =============================================================================
// RETRYING CLIENT
// =============================================================================

/// Wraps a transport with the fixed 3-attempt / 1 second retry policy.
#[derive(Clone)]
pub struct RetryingClient {
    transport: Arc<dyn HttpTransport>,
}

impl RetryingClient {
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Send one logical request. `None` after the retry budget is spent;
    /// callers treat `None` and empty uniformly as "failed".
    pub async fn send(&self, request: HttpRequest) -> Option<String> {
        for attempt in 1..=MAX_ATTEMPTS {
            match self.transport.execute(&request).await {
                Ok(response) => return Some(response),
                Err(error) => {
                    if attempt >= MAX_ATTEMPTS {
                        warn!(%error, url = %request.url, "request failed after {MAX_ATTEMPTS} attempts");
                        return None;
                    }
                    debug!(%error, url = %request.url, attempt, "request failed, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
        None
    }
}

// =============================================================================
// COOKIE HARVESTING
// =============================================================================

/// Reduce newline-joined `set-cookie` values into a single `cookie` request
/// header string (`name=value; name=value`). `None` when nothing usable
/// was set.
#[must_use]
pub fn cookie_jar_from_set_cookie(header: &str) -> Option<String> {
    let pairs: Vec<&str> = header
        .lines()
        .filter_map(|line| line.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect();

    if pairs.is_empty() {
        return None;
    }
    Some(pairs.join("; "))
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

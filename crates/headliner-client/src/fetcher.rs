use std::time::Duration;

use headliner_core::error::FetchError;
use headliner_core::models::{FetchRequest, TransportResponse};
use headliner_core::retry::RetryingFetcher;
use headliner_core::traits::Transport;
use reqwest::Client;
use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Largest response body read by default: 10 MiB.
pub const DEFAULT_MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;

/// Retrying page fetcher over the reqwest transport.
pub type ReqwestFetcher = RetryingFetcher<ReqwestTransport>;

/// Single-attempt HTTP transport using reqwest.
///
/// Holds one pooled [`Client`]; clones share the pool, so a single
/// transport can serve concurrent fetches for independent URLs. Headers
/// and the per-attempt timeout come from each [`FetchRequest`].
///
/// Success bodies are read in chunks and abandoned once they grow past
/// `max_body_bytes`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    max_body_bytes: u64,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        })
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: u64) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn max_body_bytes(&self) -> u64 {
        self.max_body_bytes
    }

    async fn read_body(
        &self,
        response: &mut reqwest::Response,
        timeout: Duration,
    ) -> Result<String, FetchError> {
        let limit = self.max_body_bytes;
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(FetchError::BodyTooLarge { max_bytes: limit });
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?
        {
            if bytes.len() as u64 + chunk.len() as u64 > limit {
                return Err(FetchError::BodyTooLarge { max_bytes: limit });
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Wrap the transport in the retry loop.
    pub fn into_fetcher(self) -> ReqwestFetcher {
        RetryingFetcher::new(self)
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: &FetchRequest) -> Result<TransportResponse, FetchError> {
        let mut builder = self
            .client
            .get(request.url().clone())
            .timeout(request.timeout());
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, request.timeout()))?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());

        // Failed responses are dropped unread; only their status matters.
        let body = if status.is_success() {
            self.read_body(&mut response, request.timeout()).await?
        } else {
            String::new()
        };

        Ok(TransportResponse {
            status: status.as_u16(),
            body,
            retry_after,
        })
    }
}

fn map_reqwest_error(e: reqwest::Error, timeout: Duration) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout { after: timeout }
    } else if e.is_redirect() {
        FetchError::Redirect(e.to_string())
    } else if e.is_builder() {
        FetchError::InvalidRequest(e.to_string())
    } else if e.is_connect() {
        FetchError::Network(format!("Connection failed: {e}"))
    } else if e.is_body() || e.is_decode() {
        FetchError::Network(format!("Failed to read response body: {e}"))
    } else {
        FetchError::Network(e.to_string())
    }
}

/// Parse a `Retry-After` header given in delta-seconds.
///
/// HTTP-date values are ignored; the backoff schedule applies instead.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

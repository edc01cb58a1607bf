//! Bounded retry with exponential backoff for page fetches.
//!
//! [`RetryingFetcher`] wraps any [`Transport`] and turns single attempts
//! into one terminal [`FetchResult`](crate::models::FetchResult):
//!
//! ```text
//! attempt 1 --[retryable]--> wait base --> attempt 2 --[retryable]--> wait base*m --> ...
//!     |                                        |
//!     +--[2xx]--> Ok                           +--[non-retryable 4xx/5xx]--> Err
//! ```
//!
//! Waits use `tokio::time`, so tests can run them on a paused clock.

use std::collections::BTreeSet;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::models::{FetchRequest, FetchResponse};
use crate::traits::{Fetcher, Transport};

/// Statuses treated as transient by default.
pub const DEFAULT_RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Retry configuration with exponential backoff.
///
/// Delay before attempt `n + 1` is `base_delay * multiplier^(n - 1)`,
/// capped at `max_delay`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    multiplier: f64,
    max_delay: Duration,
    retryable_statuses: BTreeSet<u16>,
}

impl Default for RetryPolicy {
    /// One request plus three retries, waiting 1s, 2s, 4s.
    fn default() -> Self {
        Self::new(4, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            multiplier: 2.0,
            max_delay: Duration::from_secs(60),
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.into_iter().collect(),
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_retryable_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.retryable_statuses = statuses.into_iter().collect();
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    pub(crate) fn validate(&self) -> Result<(), FetchError> {
        if self.max_attempts == 0 {
            return Err(FetchError::InvalidRequest(
                "max_attempts must be at least 1".into(),
            ));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(FetchError::InvalidRequest(format!(
                "backoff multiplier must be a finite value >= 1.0, got {}",
                self.multiplier
            )));
        }
        Ok(())
    }

    /// Delay to wait after failed attempt `attempt` (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let nanos = self.base_delay.as_nanos() as f64 * self.multiplier.powi(exponent);
        let cap = self.max_delay.as_nanos() as f64;
        if !nanos.is_finite() || nanos >= cap {
            return self.max_delay;
        }
        Duration::from_nanos(nanos.round() as u64)
    }

    /// Backoff delay, stretched to honor a server `Retry-After` hint.
    fn wait_after(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let backoff = self.delay_for_attempt(attempt);
        match retry_after {
            Some(hint) => backoff.max(hint).min(self.max_delay),
            None => backoff,
        }
    }
}

/// A [`Fetcher`] that applies each request's [`RetryPolicy`] on top of a
/// single-attempt [`Transport`].
///
/// Cloning shares the transport (and therefore its connection pool), so
/// clones may fetch independent locations concurrently.
#[derive(Debug, Clone)]
pub struct RetryingFetcher<T> {
    transport: T,
}

impl<T: Transport> RetryingFetcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Like [`Fetcher::fetch`], but gives up as soon as `cancel` fires.
    ///
    /// The in-flight attempt (or backoff wait) is dropped, releasing its
    /// connection, and the call reports [`FetchError::Timeout`].
    pub async fn fetch_cancellable(
        &self,
        request: &FetchRequest,
        cancel: &CancellationToken,
    ) -> Result<FetchResponse, FetchError> {
        let started = Instant::now();
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::warn!(url = %request.url(), "Fetch cancelled");
                Err(FetchError::Timeout { after: started.elapsed() })
            }
            result = self.fetch(request) => result,
        }
    }
}

impl<T: Transport> Fetcher for RetryingFetcher<T> {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let policy = request.retry_policy();
        let url = request.url();
        let mut attempt = 1;

        loop {
            tracing::debug!(%url, attempt, "Sending request");

            let (failure, retry_after) = match self.transport.send(request).await {
                Ok(response) if response.is_success() => {
                    tracing::debug!(%url, attempt, status = response.status, "Request succeeded");
                    return Ok(FetchResponse {
                        status: response.status,
                        body: response.body,
                        attempts: attempt,
                    });
                }
                Ok(response) => {
                    let error = FetchError::from_status(response.status);
                    if !policy.is_retryable_status(response.status) {
                        tracing::warn!(%url, attempt, status = response.status, "Non-retryable status");
                        return Err(error);
                    }
                    (error, response.retry_after)
                }
                Err(error) if error.is_transient() => (error, None),
                Err(error) => return Err(error),
            };

            if attempt >= policy.max_attempts() {
                tracing::warn!(
                    %url,
                    attempts = attempt,
                    cause = failure.cause(),
                    "Giving up after exhausting retries"
                );
                return Err(failure);
            }

            let delay = policy.wait_after(attempt, retry_after);
            tracing::warn!(
                %url,
                attempt,
                cause = failure.cause(),
                error = %failure,
                delay_ms = delay.as_millis() as u64,
                "Retrying after transient failure"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

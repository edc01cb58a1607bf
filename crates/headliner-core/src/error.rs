use std::time::Duration;

use thiserror::Error;

/// Terminal failure of a page fetch, after the retry budget is spent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, DNS, TLS or body-read failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a 4xx status.
    #[error("HTTP client error: {status}")]
    ClientError { status: u16 },

    /// The server answered with a 5xx status.
    #[error("HTTP server error: {status}")]
    ServerError { status: u16 },

    /// The request (or the caller) gave up waiting.
    #[error("Request timed out after {}ms", after.as_millis())]
    Timeout { after: Duration },

    /// Redirects could not be followed (loop, or too many hops).
    #[error("Redirect failed: {0}")]
    Redirect(String),

    /// The response body exceeded the transport's size limit.
    #[error("Response body exceeds {max_bytes} bytes")]
    BodyTooLarge { max_bytes: u64 },

    /// The request could not be built (bad URL, zero timeout, ...).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    /// Classify a terminal non-success status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            400..=499 => FetchError::ClientError { status },
            500..=599 => FetchError::ServerError { status },
            _ => FetchError::Network(format!("unexpected HTTP status {status}")),
        }
    }

    /// Returns true for transport-level failures worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Network(_) | FetchError::Timeout { .. })
    }

    /// Short cause label used in logs and reports.
    pub fn cause(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::ClientError { .. } => "http-4xx",
            FetchError::ServerError { .. } => "http-5xx",
            FetchError::Timeout { .. } => "timeout",
            FetchError::Redirect(_) => "redirect",
            FetchError::BodyTooLarge { .. } => "body-too-large",
            FetchError::InvalidRequest(_) => "invalid-request",
        }
    }
}

/// Failure to produce usable text from a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The normalized text is shorter than the caller's minimum.
    #[error("Extracted content is too short ({length} < {min_length} characters)")]
    TooShort { length: usize, min_length: usize },

    /// The parser recovered from more errors than the configured gate allows.
    #[error("Markup too degraded: {errors} parse errors (allowed {allowed})")]
    ParseDegraded { errors: usize, allowed: usize },

    /// A configured CSS selector failed to compile.
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
}

/// Failure of the title-generation backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend could not be initialized.
    #[error("Backend initialization failed: {0}")]
    Init(String),

    /// Connection failure talking to the backend.
    #[error("Backend network error: {0}")]
    Network(String),

    /// Backend call timed out.
    #[error("Backend timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limit exceeded.
    #[error("Backend rate limit exceeded")]
    RateLimited,

    /// The backend API returned an error status.
    #[error("Backend error (HTTP {status_code}): {message}")]
    Api {
        message: String,
        status_code: u16,
        retryable: bool,
    },

    /// The backend answered without any content.
    #[error("Backend returned an empty response")]
    EmptyResponse,

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BackendError {
    /// Returns true if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Network(_) | BackendError::Timeout(_) | BackendError::RateLimited => {
                true
            }
            BackendError::Api { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

/// Pipeline-level error: fetch → extract → generate.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The backend answered, but nothing in it was a usable title.
    #[error("Backend produced no usable title candidates")]
    NoCandidates,
}

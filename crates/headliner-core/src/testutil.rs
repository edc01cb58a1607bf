//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::sync::{Arc, Mutex};

use crate::error::{BackendError, ExtractionError, FetchError};
use crate::models::{
    BlockSource, ExtractedText, FetchRequest, FetchResponse, TitleOutput, TransportResponse,
};
use crate::traits::{ContentExtractor, Fetcher, TitleBackend, Transport};

pub fn ok_response(body: &str) -> TransportResponse {
    TransportResponse {
        status: 200,
        body: body.to_string(),
        retry_after: None,
    }
}

pub fn status_response(status: u16) -> TransportResponse {
    TransportResponse {
        status,
        body: String::new(),
        retry_after: None,
    }
}

// ---------------------------------------------------------------------------
// MockTransport
// ---------------------------------------------------------------------------

/// Mock transport that replays a queue of single-attempt outcomes.
#[derive(Clone)]
pub struct MockTransport {
    /// Each call pops the first element. If empty, returns a 200.
    responses: Arc<Mutex<Vec<Result<TransportResponse, FetchError>>>>,
    calls: Arc<Mutex<u32>>,
}

impl MockTransport {
    pub fn with_responses(responses: Vec<Result<TransportResponse, FetchError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

impl Transport for MockTransport {
    async fn send(&self, _request: &FetchRequest) -> Result<TransportResponse, FetchError> {
        *self.calls.lock().unwrap() += 1;
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(ok_response("<html><body>default</body></html>"))
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher that returns a configurable response.
#[derive(Clone)]
pub struct MockFetcher {
    responses: Arc<Mutex<Vec<Result<FetchResponse, FetchError>>>>,
}

impl MockFetcher {
    pub fn new(html: &str) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![Ok(FetchResponse {
                status: 200,
                body: html.to_string(),
                attempts: 1,
            })])),
        }
    }

    pub fn with_error(error: FetchError) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![Err(error)])),
        }
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, _request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(FetchResponse {
                status: 200,
                body: "<html><body>default</body></html>".to_string(),
                attempts: 1,
            })
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

/// Mock extractor: passes the markup through as text, or fails.
#[derive(Clone)]
pub struct MockExtractor {
    error: Arc<Mutex<Option<ExtractionError>>>,
}

impl MockExtractor {
    /// Returns the input unchanged, still enforcing `min_length`.
    pub fn passthrough() -> Self {
        Self {
            error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_error(error: ExtractionError) -> Self {
        Self {
            error: Arc::new(Mutex::new(Some(error))),
        }
    }
}

impl ContentExtractor for MockExtractor {
    fn extract(
        &self,
        raw_markup: &str,
        min_length: usize,
    ) -> Result<ExtractedText, ExtractionError> {
        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(e);
        }
        let length = raw_markup.chars().count();
        if length < min_length {
            return Err(ExtractionError::TooShort { length, min_length });
        }
        Ok(ExtractedText::new(
            raw_markup.to_string(),
            BlockSource::Body,
            0,
        ))
    }
}

// ---------------------------------------------------------------------------
// MockBackend
// ---------------------------------------------------------------------------

/// Mock title backend that records the text it was handed.
#[derive(Clone)]
pub struct MockBackend {
    responses: Arc<Mutex<Vec<Result<TitleOutput, BackendError>>>>,
    /// `(text, max_candidates)` for every call.
    pub calls: Arc<Mutex<Vec<(String, usize)>>>,
}

impl MockBackend {
    pub fn new(output: TitleOutput) -> Self {
        Self::with_responses(vec![Ok(output)])
    }

    pub fn with_error(error: BackendError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn with_responses(responses: Vec<Result<TitleOutput, BackendError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl TitleBackend for MockBackend {
    async fn generate(
        &self,
        text: &str,
        max_candidates: usize,
    ) -> Result<TitleOutput, BackendError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), max_candidates));
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(TitleOutput::Candidates(vec!["Default title".to_string()]))
        } else {
            responses.remove(0)
        }
    }
}

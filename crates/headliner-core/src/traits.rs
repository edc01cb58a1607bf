use std::future::Future;

use crate::error::{BackendError, ExtractionError, FetchError};
use crate::models::{ExtractedText, FetchRequest, FetchResponse, TitleOutput, TransportResponse};

/// Performs exactly one HTTP attempt for a request.
///
/// Non-2xx statuses are returned as `Ok`; only failures to get a response
/// at all (connect, timeout, body read) are errors. Retry decisions belong
/// to the caller.
pub trait Transport: Send + Sync + Clone {
    fn send(
        &self,
        request: &FetchRequest,
    ) -> impl Future<Output = Result<TransportResponse, FetchError>> + Send;
}

/// Retrieves raw markup for a request, applying its retry policy.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(
        &self,
        request: &FetchRequest,
    ) -> impl Future<Output = Result<FetchResponse, FetchError>> + Send;
}

/// Turns raw markup into normalized main-content text.
pub trait ContentExtractor: Send + Sync + Clone {
    fn extract(&self, raw_markup: &str, min_length: usize)
    -> Result<ExtractedText, ExtractionError>;
}

/// Generates headline candidates from normalized text.
pub trait TitleBackend: Send + Sync + Clone {
    fn generate(
        &self,
        text: &str,
        max_candidates: usize,
    ) -> impl Future<Output = Result<TitleOutput, BackendError>> + Send;
}

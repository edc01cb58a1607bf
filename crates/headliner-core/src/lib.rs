pub mod error;
pub mod models;
pub mod pipeline;
pub mod retry;
pub mod traits;

#[cfg(test)]
pub mod testutil;

pub use error::{AppError, BackendError, ExtractionError, FetchError};
pub use models::{
    BlockSource, ExtractReport, ExtractedText, FetchRequest, FetchResponse, FetchResult,
    TitleCandidates, TitleOutput, TitleReport, TitleRequest, TransportResponse,
};
pub use pipeline::{ContentService, TitleService};
pub use retry::{RetryPolicy, RetryingFetcher};
pub use traits::{ContentExtractor, Fetcher, TitleBackend, Transport};

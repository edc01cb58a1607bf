use crate::error::{AppError, ExtractionError};
use crate::models::{
    ExtractReport, ExtractedText, FetchRequest, TitleCandidates, TitleReport, TitleRequest,
};
use crate::traits::{ContentExtractor, Fetcher, TitleBackend};

/// Fetch → extract, with no title backend involved.
pub struct ContentService<F, X>
where
    F: Fetcher,
    X: ContentExtractor,
{
    fetcher: F,
    extractor: X,
}

impl<F, X> ContentService<F, X>
where
    F: Fetcher,
    X: ContentExtractor,
{
    pub fn new(fetcher: F, extractor: X) -> Self {
        Self { fetcher, extractor }
    }

    pub async fn extract(
        &self,
        request: &FetchRequest,
        min_length: usize,
    ) -> Result<ExtractReport, AppError> {
        tracing::info!(url = %request.url(), "Fetching");
        let response = self.fetcher.fetch(request).await?;
        tracing::info!(
            bytes = response.body.len(),
            attempts = response.attempts,
            "Fetched markup"
        );

        let text = self.extractor.extract(&response.body, min_length)?;
        tracing::info!(
            chars = text.char_len(),
            source = %text.source(),
            parse_errors = text.parse_errors(),
            "Extracted main content"
        );

        Ok(ExtractReport {
            url: request.url().to_string(),
            status: response.status,
            attempts: response.attempts,
            chars: text.char_len(),
            content: text,
        })
    }
}

/// Orchestrates the full pipeline: fetch → extract → truncate → generate.
///
/// Generic over all external dependencies via traits, enabling dependency
/// injection and testability without real HTTP or model calls. Failures
/// at any stage are terminal; nothing is re-fetched.
pub struct TitleService<F, X, B>
where
    F: Fetcher,
    X: ContentExtractor,
    B: TitleBackend,
{
    content: ContentService<F, X>,
    backend: B,
}

impl<F, X, B> TitleService<F, X, B>
where
    F: Fetcher,
    X: ContentExtractor,
    B: TitleBackend,
{
    pub fn new(fetcher: F, extractor: X, backend: B) -> Self {
        Self {
            content: ContentService::new(fetcher, extractor),
            backend,
        }
    }

    /// Fetch and extract only, without calling the backend.
    pub async fn extract(
        &self,
        request: &FetchRequest,
        min_length: usize,
    ) -> Result<ExtractReport, AppError> {
        self.content.extract(request, min_length).await
    }

    /// Run the full pipeline for one request.
    pub async fn generate(&self, request: &TitleRequest) -> Result<TitleReport, AppError> {
        let extracted = self
            .content
            .extract(&request.fetch, request.min_length)
            .await?;

        let mut report = self
            .titles_for(
                &extracted.content,
                request.max_candidates,
                request.max_input_chars,
            )
            .await?;
        report.url = Some(extracted.url);
        report.status = Some(extracted.status);
        report.attempts = Some(extracted.attempts);
        Ok(report)
    }

    /// Generate titles for text the caller already has; nothing is fetched.
    ///
    /// Whitespace is collapsed before the `min_length` check, as for
    /// extracted pages.
    pub async fn generate_from_text(
        &self,
        text: &str,
        min_length: usize,
        max_candidates: usize,
        max_input_chars: usize,
    ) -> Result<TitleReport, AppError> {
        let content = ExtractedText::from_input(text);
        let length = content.char_len();
        if length < min_length {
            return Err(ExtractionError::TooShort { length, min_length }.into());
        }
        tracing::info!(chars = length, "Using supplied text");

        self.titles_for(&content, max_candidates, max_input_chars).await
    }

    async fn titles_for(
        &self,
        text: &ExtractedText,
        max_candidates: usize,
        max_input_chars: usize,
    ) -> Result<TitleReport, AppError> {
        let input = text.truncated(max_input_chars);
        let backend_input_chars = input.chars().count();
        tracing::info!(
            chars = backend_input_chars,
            max_candidates,
            "Generating titles"
        );

        let output = self.backend.generate(input, max_candidates).await?;
        let candidates = TitleCandidates::from_output(output, max_candidates);
        if candidates.is_empty() {
            return Err(AppError::NoCandidates);
        }
        tracing::info!(count = candidates.len(), "Generated title candidates");

        Ok(TitleReport {
            url: None,
            status: None,
            attempts: None,
            source: text.source().clone(),
            extracted_chars: text.char_len(),
            backend_input_chars,
            candidates,
        })
    }
}

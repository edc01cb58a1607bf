pub mod extractor;
pub mod fetcher;
pub mod llm;

pub use extractor::{ExtractorConfig, MainContentExtractor};
pub use fetcher::{ReqwestFetcher, ReqwestTransport};
pub use llm::OpenAiTitleBackend;

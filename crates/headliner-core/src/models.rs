use std::fmt;
use std::time::Duration;

use serde::Serialize;
use url::Url;

use crate::error::FetchError;
use crate::retry::RetryPolicy;

/// Browser-like identity and negotiation headers sent unless overridden.
pub const DEFAULT_HEADERS: &[(&str, &str)] = &[
    (
        "User-Agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
    ),
    ("Accept-Language", "en-US,en;q=0.9"),
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    ),
];

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A validated, immutable page request.
///
/// Built through [`FetchRequest::builder`]; the fields cannot be changed
/// afterwards.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    url: Url,
    headers: Vec<(String, String)>,
    timeout: Duration,
    retry_policy: RetryPolicy,
}

impl FetchRequest {
    pub fn builder(url: impl Into<String>) -> FetchRequestBuilder {
        FetchRequestBuilder {
            url: url.into(),
            headers: DEFAULT_HEADERS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            timeout: DEFAULT_TIMEOUT,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }
}

/// Builder for [`FetchRequest`]. Validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct FetchRequestBuilder {
    url: String,
    headers: Vec<(String, String)>,
    timeout: Duration,
    retry_policy: RetryPolicy,
}

impl FetchRequestBuilder {
    /// Set a header, replacing any existing one with the same name
    /// (case-insensitive).
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn build(self) -> Result<FetchRequest, FetchError> {
        let url = Url::parse(&self.url)
            .map_err(|e| FetchError::InvalidRequest(format!("invalid URL '{}': {e}", self.url)))?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(FetchError::InvalidRequest(format!(
                    "URL scheme '{scheme}' is not allowed (only http/https)"
                )));
            }
        }
        if url.host_str().is_none() {
            return Err(FetchError::InvalidRequest(format!(
                "URL '{}' has no host",
                self.url
            )));
        }
        if self.timeout.is_zero() {
            return Err(FetchError::InvalidRequest(
                "timeout must be greater than zero".into(),
            ));
        }
        self.retry_policy.validate()?;

        Ok(FetchRequest {
            url,
            headers: self.headers,
            timeout: self.timeout,
            retry_policy: self.retry_policy,
        })
    }
}

/// Outcome of a single transport attempt, before retry classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// Body text; only read for 2xx responses.
    pub body: String,
    /// `Retry-After` hint in delta-seconds form, if the server sent one.
    pub retry_after: Option<Duration>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
    /// Number of attempts used, including the successful one.
    pub attempts: u32,
}

/// Fetch outcome as seen by callers.
pub type FetchResult = Result<FetchResponse, FetchError>;

/// Where the extracted text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockSource {
    /// A candidate selector matched with enough text.
    Selector(String),
    /// No selector qualified; the `<body>` element was used.
    Body,
    /// No selector qualified and there was no `<body>`.
    Document,
    /// Text handed in directly by the caller; nothing was fetched.
    Input,
}

impl fmt::Display for BlockSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockSource::Selector(s) => write!(f, "selector {s}"),
            BlockSource::Body => write!(f, "body"),
            BlockSource::Document => write!(f, "document"),
            BlockSource::Input => write!(f, "input"),
        }
    }
}

/// Normalized main-content text: whitespace collapsed, trimmed, and at
/// least as long as the minimum requested from the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedText {
    text: String,
    source: BlockSource,
    parse_errors: usize,
}

impl ExtractedText {
    pub fn new(text: String, source: BlockSource, parse_errors: usize) -> Self {
        Self {
            text,
            source,
            parse_errors,
        }
    }

    /// Wrap caller-supplied text, collapsing whitespace runs the same way
    /// extracted markup is normalized.
    pub fn from_input(raw: &str) -> Self {
        let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        Self::new(text, BlockSource::Input, 0)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn source(&self) -> &BlockSource {
        &self.source
    }

    /// Number of parse errors the lenient parser recovered from.
    pub fn parse_errors(&self) -> usize {
        self.parse_errors
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// The first `max_chars` characters, never splitting a character.
    pub fn truncated(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.text[..idx],
            None => &self.text,
        }
    }
}

/// What a title backend hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleOutput {
    /// Already-separated candidates, best first.
    Candidates(Vec<String>),
    /// One unstructured response; one candidate per line.
    Raw(String),
}

/// Ordered, non-blank title candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TitleCandidates(Vec<String>);

impl TitleCandidates {
    /// Normalize backend output: split raw text on line boundaries, trim
    /// each entry, drop blanks, and keep at most `max` entries in order.
    pub fn from_output(output: TitleOutput, max: usize) -> Self {
        let entries: Vec<String> = match output {
            TitleOutput::Candidates(list) => list,
            TitleOutput::Raw(raw) => raw.lines().map(str::to_string).collect(),
        };

        Self(
            entries
                .iter()
                .map(|entry| entry.trim())
                .filter(|entry| !entry.is_empty())
                .take(max)
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// One end-to-end title generation request.
#[derive(Debug, Clone)]
pub struct TitleRequest {
    pub fetch: FetchRequest,
    /// Minimum extracted length, in characters.
    pub min_length: usize,
    pub max_candidates: usize,
    /// Maximum characters of extracted text handed to the backend.
    pub max_input_chars: usize,
}

/// Result of fetching and extracting one page.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractReport {
    pub url: String,
    pub status: u16,
    pub attempts: u32,
    pub chars: usize,
    #[serde(flatten)]
    pub content: ExtractedText,
}

/// Result of the full pipeline.
///
/// The fetch fields are empty when titles were generated from
/// caller-supplied text.
#[derive(Debug, Clone, Serialize)]
pub struct TitleReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    pub source: BlockSource,
    pub extracted_chars: usize,
    pub backend_input_chars: usize,
    pub candidates: TitleCandidates,
}

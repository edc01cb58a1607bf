use std::sync::Arc;

use headliner_core::error::ExtractionError;
use headliner_core::models::{BlockSource, ExtractedText};
use headliner_core::traits::ContentExtractor;
use scraper::{ElementRef, Html, Selector};

/// Candidate containers, most specific first. Order is significant.
pub const DEFAULT_CANDIDATE_SELECTORS: &[&str] = &[
    r#"div[class*="article"]"#,
    r#"div[class*="post"]"#,
    "main",
    "article",
    r#"div[id*="content"]"#,
    r#"div[class*="content"]"#,
];

/// Subtrees dropped before ranking.
pub const DEFAULT_REMOVED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "nav", "header", "footer", "aside", "form",
];

/// Tags whose text makes up the extracted content.
pub const DEFAULT_CONTENT_TAGS: &[&str] = &["p", "h1", "h2", "h3", "h4", "li"];

/// A candidate block must have strictly more characters than this.
pub const DEFAULT_BLOCK_THRESHOLD: usize = 500;

/// Tuning for [`MainContentExtractor`].
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// CSS selectors tried in order; the first long-enough match wins.
    pub candidate_selectors: Vec<String>,
    pub block_threshold: usize,
    pub removed_tags: Vec<String>,
    pub content_tags: Vec<String>,
    /// Reject documents the parser had to repair more than this many
    /// times. `None` accepts any markup.
    pub max_parse_errors: Option<usize>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            candidate_selectors: to_strings(DEFAULT_CANDIDATE_SELECTORS),
            block_threshold: DEFAULT_BLOCK_THRESHOLD,
            removed_tags: to_strings(DEFAULT_REMOVED_TAGS),
            content_tags: to_strings(DEFAULT_CONTENT_TAGS),
            max_parse_errors: None,
        }
    }
}

impl ExtractorConfig {
    pub fn with_block_threshold(mut self, threshold: usize) -> Self {
        self.block_threshold = threshold;
        self
    }

    pub fn with_max_parse_errors(mut self, allowed: usize) -> Self {
        self.max_parse_errors = Some(allowed);
        self
    }

    pub fn with_candidate_selectors(mut self, selectors: &[&str]) -> Self {
        self.candidate_selectors = to_strings(selectors);
        self
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// One entry of the selector-priority list.
#[derive(Debug, Clone)]
struct CandidateRule {
    label: String,
    selector: Selector,
}

impl CandidateRule {
    /// First matching element in document order.
    fn first_match<'a>(&self, doc: &'a Html) -> Option<ElementRef<'a>> {
        doc.select(&self.selector).next()
    }
}

#[derive(Debug)]
struct Compiled {
    rules: Vec<CandidateRule>,
    removed: Selector,
    body: Selector,
    content_tags: Vec<String>,
    block_threshold: usize,
    max_parse_errors: Option<usize>,
}

/// Main-content extractor over a lenient HTML5 parser.
///
/// Strips non-content subtrees, picks the first candidate block whose
/// flattened text exceeds the threshold (falling back to `<body>`), then
/// joins the text of paragraph, heading and list-item descendants.
/// Pure and deterministic: identical markup always yields identical text.
#[derive(Debug, Clone)]
pub struct MainContentExtractor {
    inner: Arc<Compiled>,
}

impl MainContentExtractor {
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractionError> {
        let rules = config
            .candidate_selectors
            .iter()
            .map(|css| {
                Ok(CandidateRule {
                    label: css.clone(),
                    selector: parse_selector(css)?,
                })
            })
            .collect::<Result<Vec<_>, ExtractionError>>()?;

        let removed = if config.removed_tags.is_empty() {
            // Matches nothing in an HTML document.
            parse_selector(":not(*)")?
        } else {
            parse_selector(&config.removed_tags.join(", "))?
        };

        Ok(Self {
            inner: Arc::new(Compiled {
                rules,
                removed,
                body: parse_selector("body")?,
                content_tags: config
                    .content_tags
                    .iter()
                    .map(|t| t.to_ascii_lowercase())
                    .collect(),
                block_threshold: config.block_threshold,
                max_parse_errors: config.max_parse_errors,
            }),
        })
    }

    /// Pick the content block: first qualifying candidate, else body, else root.
    fn select_block<'a>(&self, doc: &'a Html) -> (ElementRef<'a>, BlockSource) {
        for rule in &self.inner.rules {
            let Some(element) = rule.first_match(doc) else {
                continue;
            };
            let length = flatten_text(element).chars().count();
            tracing::debug!(selector = %rule.label, chars = length, "Candidate block");
            if length > self.inner.block_threshold {
                return (element, BlockSource::Selector(rule.label.clone()));
            }
        }

        match doc.select(&self.inner.body).next() {
            Some(body) => {
                tracing::debug!("No candidate qualified, falling back to body");
                (body, BlockSource::Body)
            }
            None => (doc.root_element(), BlockSource::Document),
        }
    }

    fn collect_content(&self, block: ElementRef<'_>) -> String {
        let parts: Vec<String> = block
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .filter(|el| {
                self.inner
                    .content_tags
                    .iter()
                    .any(|tag| tag == el.value().name())
            })
            .map(flatten_text)
            .filter(|part| !part.is_empty())
            .collect();

        collapse_whitespace(parts.iter().map(String::as_str))
    }
}

impl ContentExtractor for MainContentExtractor {
    fn extract(
        &self,
        raw_markup: &str,
        min_length: usize,
    ) -> Result<ExtractedText, ExtractionError> {
        let mut doc = Html::parse_document(raw_markup);
        let parse_errors = doc.errors.len();
        if let Some(allowed) = self.inner.max_parse_errors {
            if parse_errors > allowed {
                return Err(ExtractionError::ParseDegraded {
                    errors: parse_errors,
                    allowed,
                });
            }
        }

        remove_subtrees(&mut doc, &self.inner.removed);

        let (block, source) = self.select_block(&doc);
        let text = self.collect_content(block);
        let length = text.chars().count();
        if length < min_length {
            return Err(ExtractionError::TooShort { length, min_length });
        }

        Ok(ExtractedText::new(text, source, parse_errors))
    }
}

fn parse_selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::InvalidSelector(format!("{css}: {e}")))
}

/// Detach every element matching `selector`, with its whole subtree.
fn remove_subtrees(doc: &mut Html, selector: &Selector) {
    let ids: Vec<_> = doc.select(selector).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// All descendant text, space-joined with whitespace collapsed.
fn flatten_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(element.text())
}

fn collapse_whitespace<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for word in parts.flat_map(str::split_whitespace) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

use headliner_client::{ExtractorConfig, MainContentExtractor};
use headliner_core::{BlockSource, ContentExtractor, ExtractionError};

use crate::common::{BLOG_PAGE, extractor};

#[test]
fn blog_page_selects_post_body() {
    let text = extractor().extract(BLOG_PAGE, 100).unwrap();

    assert_eq!(
        text.source(),
        &BlockSource::Selector(r#"div[class*="post"]"#.into())
    );
    assert!(text.as_str().starts_with("From Large to Small Language Models"));
    assert!(text.as_str().contains("Why smaller models?"));
    assert!(text.as_str().contains("Data never leaves the deployment"));
    assert!(text.as_str().ends_with("production pipelines."));
}

#[test]
fn blog_page_drops_chrome() {
    let text = extractor().extract(BLOG_PAGE, 100).unwrap();

    for boilerplate in [
        "Home",
        "Popular",
        "Ten tips",
        "Subscribe",
        "All rights reserved",
        "dataLayer",
        "font-family",
    ] {
        assert!(
            !text.as_str().contains(boilerplate),
            "{boilerplate:?} leaked into extracted text"
        );
    }
}

#[test]
fn blog_page_text_is_normalized() {
    let text = extractor().extract(BLOG_PAGE, 100).unwrap();

    assert!(!text.as_str().contains("  "));
    assert!(!text.as_str().contains('\n'));
    assert_eq!(text.as_str(), text.as_str().trim());
}

#[test]
fn raising_the_threshold_falls_back_to_body() {
    let strict =
        MainContentExtractor::new(ExtractorConfig::default().with_block_threshold(10_000))
            .unwrap();

    let text = strict.extract(BLOG_PAGE, 100).unwrap();

    assert_eq!(text.source(), &BlockSource::Body);
    // Header, nav, aside, form and footer are gone before the fallback too.
    assert!(!text.as_str().contains("Popular"));
    assert!(text.as_str().contains("Small language models"));
}

#[test]
fn blog_page_rejected_when_minimum_is_higher_than_content() {
    let err = extractor().extract(BLOG_PAGE, 5_000).unwrap_err();

    assert!(matches!(
        err,
        ExtractionError::TooShort {
            min_length: 5_000,
            ..
        }
    ));
}

#[test]
fn truncated_page_is_still_extracted() {
    let cut = &BLOG_PAGE[..BLOG_PAGE.find("<h2>").unwrap()];

    let text = extractor().extract(cut, 10).unwrap();

    assert!(text.as_str().contains("Small language models are changing"));
    assert!(!text.as_str().contains("Why smaller models?"));
}

#[test]
fn extractor_is_shareable_across_threads() {
    let extractor = extractor();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let extractor = extractor.clone();
            std::thread::spawn(move || extractor.extract(BLOG_PAGE, 100).unwrap())
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}

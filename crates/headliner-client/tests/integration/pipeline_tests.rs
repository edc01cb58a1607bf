use std::time::Duration;

use headliner_client::OpenAiTitleBackend;
use headliner_core::{
    AppError, BlockSource, ContentService, ExtractionError, FetchError, FetchRequest, RetryPolicy,
    TitleRequest, TitleService,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{BLOG_PAGE, chat_completion, extractor, fetcher};

async fn mount_backend(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(
            "1. Small Models, Big Agents\n2. Why SLMs Win\n3. Agentic AI on a Budget",
        )))
        .mount(server)
        .await;
}

fn service(
    server: &MockServer,
) -> TitleService<headliner_client::ReqwestFetcher, headliner_client::MainContentExtractor, OpenAiTitleBackend>
{
    let backend = OpenAiTitleBackend::with_base_url(
        "sk-test",
        "test-model",
        &format!("{}/v1", server.uri()),
    )
    .unwrap();
    TitleService::new(fetcher(), extractor(), backend)
}

fn title_request(url: String) -> TitleRequest {
    TitleRequest {
        fetch: FetchRequest::builder(url)
            .retry_policy(RetryPolicy::new(3, Duration::from_millis(10)))
            .build()
            .unwrap(),
        min_length: 100,
        max_candidates: 2,
        max_input_chars: 300,
    }
}

#[tokio::test]
async fn page_to_titles_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blog/slms"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(BLOG_PAGE, "text/html"))
        .mount(&server)
        .await;
    mount_backend(&server).await;

    let report = service(&server)
        .generate(&title_request(format!("{}/blog/slms", server.uri())))
        .await
        .unwrap();

    assert_eq!(report.status, Some(200));
    assert_eq!(report.attempts, Some(1));
    assert_eq!(
        report.source,
        BlockSource::Selector(r#"div[class*="post"]"#.into())
    );
    assert!(report.extracted_chars > 500);
    assert_eq!(report.backend_input_chars, 300);
    assert_eq!(
        report.candidates.into_vec(),
        vec!["1. Small Models, Big Agents", "2. Why SLMs Win"]
    );
}

#[tokio::test]
async fn thin_page_stops_before_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/thin"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html><body><p>Hi</p></body></html>", "text/html"),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let err = service(&server)
        .generate(&title_request(format!("{}/thin", server.uri())))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Extraction(_)));
}

#[tokio::test]
async fn gone_page_is_a_client_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .expect(1)
        .mount(&server)
        .await;

    let err = service(&server)
        .generate(&title_request(format!("{}/gone", server.uri())))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Fetch(FetchError::ClientError { status: 410 })
    ));
}

#[tokio::test]
async fn supplied_text_goes_straight_to_backend() {
    let server = MockServer::start().await;
    mount_backend(&server).await;

    let text = "Small language models are changing how agentic systems are built, \
                one compact specialised model at a time, close to the data they serve.";
    let report = service(&server)
        .generate_from_text(text, 100, 3, 8000)
        .await
        .unwrap();

    assert_eq!(report.url, None);
    assert_eq!(report.source, BlockSource::Input);
    assert_eq!(report.candidates.len(), 3);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method.as_str(), "POST");
}

#[tokio::test]
async fn short_supplied_text_is_rejected() {
    let server = MockServer::start().await;

    let err = service(&server)
        .generate_from_text("Too short to title.", 100, 3, 8000)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Extraction(ExtractionError::TooShort {
            min_length: 100,
            ..
        })
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn content_service_reports_extraction() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blog/slms"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(BLOG_PAGE, "text/html"))
        .mount(&server)
        .await;

    let url = format!("{}/blog/slms", server.uri());
    let report = ContentService::new(fetcher(), extractor())
        .extract(&FetchRequest::builder(url.clone()).build().unwrap(), 100)
        .await
        .unwrap();

    assert_eq!(report.url, url);
    assert_eq!(report.status, 200);
    assert_eq!(report.chars, report.content.char_len());
    assert!(report.content.as_str().starts_with("From Large to Small"));
}

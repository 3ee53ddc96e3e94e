//! Integration tests for `FeedAdapter` using wiremock HTTP mocks.

use hookwatch_core::Source;
use hookwatch_sources::{FeedAdapter, SourceAdapter, SourceError};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <link>https://news.test/</link>
    <item>
      <title>First</title>
      <link>https://news.test/first</link>
      <description>First body</description>
      <pubDate>Tue, 05 Mar 2024 10:00:00 +0000</pubDate>
    </item>
    <item>
      <title>Second</title>
      <link>https://news.test/second</link>
      <description>Second body</description>
      <pubDate>Tue, 05 Mar 2024 11:00:00 +0000</pubDate>
    </item>
  </channel>
</rss>"#;

fn adapter() -> FeedAdapter {
    FeedAdapter::new(5, "hookwatch-test/0.1").expect("client construction should not fail")
}

#[tokio::test]
async fn fetch_returns_items_and_profile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .and(header("user-agent", "hookwatch-test/0.1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/rss+xml")
                .set_body_string(RSS),
        )
        .mount(&server)
        .await;

    let source = Source::feed(&format!("{}/feed.xml", server.uri()), None, None);
    let fetched = adapter().fetch(&source).await.expect("fetch should succeed");

    assert_eq!(fetched.items.len(), 2);
    assert_eq!(fetched.items[0].title.as_deref(), Some("First"));
    assert_eq!(
        fetched.profile.and_then(|p| p.name).as_deref(),
        Some("Test Feed")
    );
}

#[tokio::test]
async fn fetch_non_2xx_is_unexpected_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let source = Source::feed(&format!("{}/feed.xml", server.uri()), None, None);
    let result = adapter().fetch(&source).await;

    assert!(
        matches!(result, Err(SourceError::UnexpectedStatus { status: 503, .. })),
        "expected UnexpectedStatus(503), got: {result:?}"
    );
}

#[tokio::test]
async fn fetch_html_page_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>nope</body></html>"))
        .mount(&server)
        .await;

    let source = Source::feed(&format!("{}/feed.xml", server.uri()), None, None);
    let result = adapter().fetch(&source).await;

    assert!(
        matches!(result, Err(SourceError::FeedParse(_))),
        "expected FeedParse, got: {result:?}"
    );
}

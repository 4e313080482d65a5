//! Emulated Torznab endpoint tests.

mod common;

use axum::http::{header, StatusCode};
use common::{fixtures, TestConfig, TestFixture};
use mulearr_core::{search::PROBE_HASH, BackendError};

#[tokio::test]
async fn test_caps_document() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api?t=caps").await;

    assert_eq!(response.status, StatusCode::OK);
    let content_type = response.headers[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("application/xml"));
    for id in ["5000", "5030", "5040", "5045", "2000", "2030", "2040", "2045"] {
        assert!(
            response.text.contains(&format!("id=\"{}\"", id)),
            "missing category {}",
            id
        );
    }
    assert!(response.text.contains("<tv-search available=\"yes\""));
}

#[tokio::test]
async fn test_torznab_alias_path() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/torznab/api?t=caps").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text.contains("<caps>"));
}

#[tokio::test]
async fn test_empty_search_returns_probe_item() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api?t=search&cat=5000,2000").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text.matches("<item>").count(), 1);
    assert!(response.text.contains(&format!("{}00000000", PROBE_HASH)));
    assert!(response
        .text
        .contains(r#"<torznab:attr name="category" value="5040" />"#));
    assert!(fixture.backend.search_calls().await.is_empty());
}

#[tokio::test]
async fn test_episode_filters_without_query_return_nothing() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api?t=tvsearch&season=1&ep=2&tvdbid=12345").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(!response.text.contains("<item>"));
    assert!(fixture.backend.search_calls().await.is_empty());
}

#[tokio::test]
async fn test_tvsearch_expands_and_merges_variants() {
    let fixture = TestFixture::new().await;
    fixture
        .backend
        .set_search_results(
            "The Show 1x01",
            vec![
                fixtures::search_hit("The.Show.1x01.HDTV", fixtures::HASH_A),
                fixtures::search_hit("The.Show.S01E01.720p", fixtures::HASH_B),
            ],
        )
        .await;
    fixture
        .backend
        .set_search_results(
            "The Show S01E01",
            vec![fixtures::search_hit("The.Show.S01E01.720p", fixtures::HASH_B)],
        )
        .await;

    let response = fixture
        .get("/api?t=tvsearch&q=The%20Show&season=1&ep=1")
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let queries: Vec<String> = fixture
        .backend
        .search_calls()
        .await
        .into_iter()
        .map(|c| c.query)
        .collect();
    assert_eq!(queries, vec!["The Show 1x01", "The Show S01E01"]);
    assert_eq!(response.text.matches("<item>").count(), 2);
    assert!(response
        .text
        .contains(r#"<torznab:response offset="0" total="2" />"#));
}

#[tokio::test]
async fn test_repeated_search_served_from_cache() {
    let fixture = TestFixture::new().await;
    fixture
        .backend
        .set_default_search_results(vec![fixtures::search_hit("Heat.1995", fixtures::HASH_C)])
        .await;

    let first = fixture.get("/api?t=movie&q=Heat").await;
    let second = fixture.get("/api?t=movie&q=Heat").await;

    assert_eq!(first.text.matches("<item>").count(), 1);
    assert_eq!(second.text.matches("<item>").count(), 1);
    assert_eq!(fixture.backend.search_calls().await.len(), 1);
}

#[tokio::test]
async fn test_limit_and_offset() {
    let fixture = TestFixture::new().await;
    fixture
        .backend
        .set_default_search_results(vec![
            fixtures::search_hit("one", fixtures::HASH_A),
            fixtures::search_hit("two", fixtures::HASH_B),
            fixtures::search_hit("three", fixtures::HASH_C),
        ])
        .await;

    let response = fixture.get("/api?t=search&q=numbers&limit=1&offset=1").await;

    assert_eq!(response.text.matches("<item>").count(), 1);
    assert!(response.text.contains("<title>two</title>"));
    assert!(response
        .text
        .contains(r#"<torznab:response offset="1" total="3" />"#));
}

#[tokio::test]
async fn test_backend_failure_returns_empty_feed() {
    let fixture = TestFixture::new().await;
    fixture.backend.set_next_error(BackendError::Timeout).await;

    let response = fixture.get("/api?t=search&q=anything").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.text.contains("<rss"));
    assert!(response.text.contains("<channel>"));
    assert!(!response.text.contains("<item>"));

    // Failures are not cached; the retry reaches the backend again.
    let retry = fixture.get("/api?t=search&q=anything").await;
    assert_eq!(retry.status, StatusCode::OK);
    assert_eq!(fixture.backend.search_calls().await.len(), 2);
}

#[tokio::test]
async fn test_unknown_function_is_torznab_error() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api?t=music").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.text.contains(r#"<error code="202""#));
}

#[tokio::test]
async fn test_missing_function_is_torznab_error() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.text.contains(r#"<error code="200""#));
}

#[tokio::test]
async fn test_api_key_required_when_configured() {
    let fixture = TestFixture::with_config(TestConfig::with_api_key("s3cret")).await;

    let denied = fixture.get("/api?t=caps").await;
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);
    assert!(denied.text.contains(r#"<error code="100""#));

    let allowed = fixture.get("/api?t=caps&apikey=s3cret").await;
    assert_eq!(allowed.status, StatusCode::OK);

    // The download-client API is not guarded by the indexer key.
    let info = fixture.get("/api/v2/app/version").await;
    assert_eq!(info.status, StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_endpoint_reports_requests() {
    let fixture = TestFixture::new().await;
    fixture.get("/api?t=caps").await;

    let response = fixture.get("/metrics").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text.contains("mulearr_http_requests_total"));
}

//! Common test utilities for in-process API testing with mocks.
//!
//! `TestFixture` builds the real router around a `MockBackend` and an
//! on-disk hash store in a temporary directory, so the emulated APIs can
//! be driven end to end without a backend daemon.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use mulearr_core::{
    load_config_from_str, testing::MockBackend, Authenticator, DownloadController,
    SearchGateway, SqliteHashStore, StaticCategories,
};
use mulearr_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use mulearr_core::testing::fixtures;

/// Test fixture with a controllable backend.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_list() {
///     let fixture = TestFixture::new().await;
///     let response = fixture.get("/api/v2/torrents/info").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock backend - script downloads, shared files and search results
    pub backend: Arc<MockBackend>,
    /// Hash store shared with the router
    pub store: Arc<SqliteHashStore>,
    /// Temporary directory holding the database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text).unwrap_or(Value::Null)
    }
}

/// Configuration for the test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Require this API key on the indexer endpoint.
    pub api_key: Option<String>,
    pub min_interval_ms: u64,
    pub cache_ttl_ms: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            min_interval_ms: 0,
            cache_ttl_ms: 600_000,
        }
    }
}

impl TestConfig {
    pub fn with_api_key(key: &str) -> Self {
        Self {
            api_key: Some(key.to_string()),
            ..Default::default()
        }
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("mulearr.db");

        let auth_section = match &test_config.api_key {
            Some(key) => format!("method = \"api_key\"\napi_key = \"{}\"", key),
            None => "method = \"none\"".to_string(),
        };
        let config = load_config_from_str(&format!(
            r#"
[auth]
{auth}

[database]
path = "{db}"

[backend]
url = "http://127.0.0.1:9"

[search]
min_interval_ms = {interval}
cache_ttl_ms = {ttl}
max_results = 100

[downloads]
default_category_id = 0
save_path = "/incoming"

[[downloads.categories]]
id = 1
label = "sonarr"
path = "/incoming/tv"

[[downloads.categories]]
id = 2
label = "radarr"
path = "/incoming/movies"
"#,
            auth = auth_section,
            db = db_path.display(),
            interval = test_config.min_interval_ms,
            ttl = test_config.cache_ttl_ms,
        ))
        .expect("Failed to parse test config");

        let authenticator: Arc<dyn Authenticator> = Arc::from(
            mulearr_core::create_authenticator(&config.auth)
                .expect("Failed to create authenticator"),
        );
        let store = Arc::new(SqliteHashStore::new(&db_path).expect("Failed to create store"));
        let backend = Arc::new(MockBackend::new());

        let controller = Arc::new(DownloadController::new(
            backend.clone(),
            store.clone(),
            Arc::new(StaticCategories::from_config(&config.downloads)),
            config.downloads.default_category_id,
            config.downloads.save_path.clone(),
        ));
        let gateway = Arc::new(SearchGateway::new(backend.clone(), &config.search));

        let state = Arc::new(AppState::new(
            config,
            authenticator,
            controller,
            gateway,
            store.clone(),
        ));

        Self {
            router: create_router(state),
            backend,
            store,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// Send a url-encoded form POST. `body` must already be encoded.
    pub async fn post_form(&self, path: &str, body: &str) -> TestResponse {
        self.send(
            Request::post(path)
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Send a multipart/form-data POST with text fields.
    pub async fn post_multipart(&self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let boundary = "mulearr-test-boundary";
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, name, value
            ));
        }
        body.push_str(&format!("--{}--\r\n", boundary));

        self.send(
            Request::post(path)
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        TestResponse {
            status,
            headers,
            text: String::from_utf8_lossy(&body_bytes).into_owned(),
        }
    }
}

/// Percent-encode a value for a url-encoded form body.
pub fn form_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

//! Emulated qBittorrent Web API tests.
//!
//! Drives the router in-process the way Sonarr/Radarr do: login, add by
//! magnet, poll torrents/info, delete.

mod common;

use axum::http::{header, StatusCode};
use common::{fixtures, form_encode, TestFixture};
use mulearr_core::{native_to_borrowed, BackendError, HashIdentityStore};

fn magnet(hash: &str, name: &str, size: u64) -> String {
    native_to_borrowed(hash, name, size).uri
}

fn borrowed(hash: &str) -> String {
    format!("{}00000000", hash)
}

#[tokio::test]
async fn test_login_sets_sid_cookie() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post_form("/api/v2/auth/login", "username=admin&password=adminadmin")
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text, "Ok.");
    let cookie = response.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("SID="));
}

#[tokio::test]
async fn test_app_version_endpoints() {
    let fixture = TestFixture::new().await;

    let version = fixture.get("/api/v2/app/version").await;
    assert_eq!(version.status, StatusCode::OK);
    assert!(version.text.starts_with('v'));

    let api = fixture.get("/api/v2/app/webapiVersion").await;
    assert_eq!(api.text, "2.9.3");

    let prefs = fixture.get("/api/v2/app/preferences").await.json();
    assert_eq!(prefs["max_ratio_enabled"], false);
    assert_eq!(prefs["save_path"], "/incoming");
}

#[tokio::test]
async fn test_add_multipart_then_list_by_category() {
    let fixture = TestFixture::new().await;
    let link = magnet(fixtures::HASH_A, "Show.S01E01.720p", 1000);

    let response = fixture
        .post_multipart(
            "/api/v2/torrents/add",
            &[("urls", link.as_str()), ("category", "sonarr")],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text, "Ok.");

    let added = fixture.backend.added_links().await;
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].1, 1);

    let mut record = fixtures::download("Show.S01E01.720p", fixtures::HASH_A, 500, 1000);
    record.speed = 100;
    record.source_count = 4;
    record.category = 1;
    fixture.backend.set_downloads(vec![record]).await;

    let response = fixture.get("/api/v2/torrents/info?category=sonarr").await;
    assert_eq!(response.status, StatusCode::OK);
    let torrents = response.json();
    let torrents = torrents.as_array().unwrap();
    assert_eq!(torrents.len(), 1);

    let t = &torrents[0];
    assert_eq!(t["hash"], borrowed(fixtures::HASH_A));
    assert_eq!(t["name"], "Show.S01E01.720p");
    assert_eq!(t["state"], "downloading");
    assert_eq!(t["progress"], 0.5);
    assert_eq!(t["eta"], 5);
    assert_eq!(t["category"], "sonarr");
    assert_eq!(t["save_path"], "/incoming/tv");
    assert_eq!(t["num_seeds"], 4);
    assert_eq!(t["ratio_limit"], -2);

    let other = fixture.get("/api/v2/torrents/info?category=radarr").await;
    assert_eq!(other.json().as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_add_urlencoded_with_bad_link_reports_fail() {
    let fixture = TestFixture::new().await;
    let urls = format!(
        "{}\nmagnet:?xt=urn:btih:{}ffffffff&dn=broken",
        magnet(fixtures::HASH_B, "Movie.2020", 10),
        fixtures::HASH_C
    );

    let response = fixture
        .post_form(
            "/api/v2/torrents/add",
            &format!("urls={}&category=radarr", form_encode(&urls)),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text, "Fail.");
    assert!(fixture
        .store
        .lookup_borrowed(fixtures::HASH_B)
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_add_without_urls_is_bad_request() {
    let fixture = TestFixture::new().await;

    let response = fixture.post_form("/api/v2/torrents/add", "category=sonarr").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(fixture.backend.added_links().await.is_empty());
}

#[tokio::test]
async fn test_add_rejected_by_backend_reports_fail() {
    let fixture = TestFixture::new().await;
    fixture.backend.set_add_result(false).await;

    let response = fixture
        .post_form(
            "/api/v2/torrents/add",
            &format!("urls={}", form_encode(&magnet(fixtures::HASH_A, "x", 1))),
        )
        .await;

    assert_eq!(response.text, "Fail.");
    assert!(fixture.store.get(fixtures::HASH_A).unwrap().is_none());
}

#[tokio::test]
async fn test_info_unavailable_when_backend_disconnected() {
    let fixture = TestFixture::new().await;
    fixture.backend.set_connected(false).await;

    let response = fixture.get("/api/v2/torrents/info").await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_info_hashes_filter() {
    let fixture = TestFixture::new().await;
    fixture
        .backend
        .set_shared(vec![
            fixtures::shared_file("a.mkv", fixtures::HASH_A, 10),
            fixtures::shared_file("b.mkv", fixtures::HASH_B, 20),
        ])
        .await;

    let all = fixture.get("/api/v2/torrents/info?hashes=all").await.json();
    assert_eq!(all.as_array().unwrap().len(), 2);

    let one = fixture
        .get(&format!("/api/v2/torrents/info?hashes={}", fixtures::HASH_B))
        .await
        .json();
    let one = one.as_array().unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0]["name"], "b.mkv");
    assert_eq!(one[0]["state"], "stalledUP");
}

#[tokio::test]
async fn test_delete_resolves_mapping_and_always_says_ok() {
    let fixture = TestFixture::new().await;
    fixture
        .post_form(
            "/api/v2/torrents/add",
            &format!("urls={}", form_encode(&magnet(fixtures::HASH_A, "x", 1))),
        )
        .await;

    let body = format!(
        "hashes={}%7C{}&deleteFiles=true",
        borrowed(fixtures::HASH_A),
        fixtures::HASH_C
    );
    fixture.backend.set_cancel_result(true).await;
    let response = fixture.post_form("/api/v2/torrents/delete", &body).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text, "Ok.");
    assert_eq!(
        fixture.backend.cancelled_hashes().await,
        vec![fixtures::HASH_A.to_string(), fixtures::HASH_C.to_string()]
    );
    assert!(fixture
        .store
        .lookup_native(&borrowed(fixtures::HASH_A))
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_delete_backend_failure_still_ok() {
    let fixture = TestFixture::new().await;
    fixture
        .backend
        .set_next_error(BackendError::ConnectionFailed("down".to_string()))
        .await;

    let response = fixture
        .post_form(
            "/api/v2/torrents/delete",
            &format!("hashes={}&deleteFiles=false", fixtures::HASH_B),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text, "Ok.");
}

#[tokio::test]
async fn test_pause_and_resume_are_noops() {
    let fixture = TestFixture::new().await;

    for path in [
        "/api/v2/torrents/pause",
        "/api/v2/torrents/resume",
        "/api/v2/torrents/stop",
        "/api/v2/torrents/start",
    ] {
        let response = fixture
            .post_form(path, &format!("hashes={}", fixtures::HASH_A))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", path);
        assert_eq!(response.text, "Ok.");
    }
    assert!(fixture.backend.cancelled_hashes().await.is_empty());
}

#[tokio::test]
async fn test_categories_listed_from_config() {
    let fixture = TestFixture::new().await;

    let categories = fixture.get("/api/v2/torrents/categories").await.json();

    assert_eq!(categories["sonarr"]["name"], "sonarr");
    assert_eq!(categories["sonarr"]["savePath"], "/incoming/tv");
    assert_eq!(categories["radarr"]["savePath"], "/incoming/movies");

    let created = fixture
        .post_form("/api/v2/torrents/createCategory", "category=lidarr")
        .await;
    assert_eq!(created.text, "Ok.");
}

#[tokio::test]
async fn test_properties_and_files() {
    let fixture = TestFixture::new().await;
    fixture
        .backend
        .set_shared(vec![fixtures::shared_file("done.mkv", fixtures::HASH_C, 4096)])
        .await;

    let props = fixture
        .get(&format!("/api/v2/torrents/properties?hash={}", fixtures::HASH_C))
        .await;
    assert_eq!(props.status, StatusCode::OK);
    assert_eq!(props.json()["total_size"], 4096);

    let files = fixture
        .get(&format!("/api/v2/torrents/files?hash={}", fixtures::HASH_C))
        .await
        .json();
    assert_eq!(files[0]["name"], "done.mkv");
    assert_eq!(files[0]["progress"], 1.0);

    let missing = fixture
        .get(&format!("/api/v2/torrents/properties?hash={}", fixtures::HASH_A))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_info_category_filter_ignores_case() {
    let fixture = TestFixture::new().await;
    fixture
        .post_form(
            "/api/v2/torrents/add",
            &format!(
                "urls={}&category=Sonarr",
                form_encode(&magnet(fixtures::HASH_B, "Show.S02E03", 10))
            ),
        )
        .await;
    let category_id = fixture.backend.added_links().await[0].1;

    let mut record = fixtures::download("Show.S02E03", fixtures::HASH_B, 0, 10);
    record.category = category_id;
    fixture.backend.set_downloads(vec![record]).await;

    let listed = fixture
        .get("/api/v2/torrents/info?category=Sonarr")
        .await
        .json();
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["category"], "sonarr");
}

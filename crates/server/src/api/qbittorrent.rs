//! Emulated qBittorrent Web API (v2) handlers.
//!
//! Responses follow qBittorrent's conventions: plain `Ok.` / `Fail.` bodies
//! for actions and JSON for queries.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{FromRequest, Multipart, Query, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use mulearr_core::{ControllerError, TorrentFile, TorrentInfo, TorrentProperties};

use crate::metrics::record_add;
use crate::state::AppState;

const APP_VERSION: &str = "v4.6.3";
const WEB_API_VERSION: &str = "2.9.3";

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct InfoParams {
    #[serde(default)]
    pub category: Option<String>,
    /// `|`-separated, or `all`.
    #[serde(default)]
    pub hashes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddForm {
    #[serde(default)]
    pub urls: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub hashes: String,
    #[serde(default, rename = "deleteFiles")]
    pub delete_files: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HashesForm {
    #[serde(default)]
    pub hashes: String,
}

#[derive(Debug, Deserialize)]
pub struct HashParam {
    pub hash: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryEntry {
    pub name: String,
    #[serde(rename = "savePath")]
    pub save_path: String,
}

#[derive(Debug, Serialize)]
pub struct Preferences {
    pub save_path: String,
    pub temp_path_enabled: bool,
    pub max_ratio_enabled: bool,
    pub max_ratio: f64,
    pub max_ratio_act: i32,
    pub max_seeding_time_enabled: bool,
    pub max_seeding_time: i64,
    pub queueing_enabled: bool,
    pub dht: bool,
    pub auto_tmm_enabled: bool,
}

/// Error surfaced through the emulated API as a plain-text body.
#[derive(Debug)]
pub struct QbtError(StatusCode, String);

impl IntoResponse for QbtError {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

impl From<ControllerError> for QbtError {
    fn from(e: ControllerError) -> Self {
        let status = match &e {
            ControllerError::BackendUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ControllerError::Validation(_) => StatusCode::BAD_REQUEST,
            ControllerError::Backend(_) | ControllerError::Store(_) => {
                error!(error = %e, "Download client request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        QbtError(status, e.to_string())
    }
}

fn ok() -> &'static str {
    "Ok."
}

fn is_truthy(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

// ============================================================================
// Auth / app
// ============================================================================

/// POST /api/v2/auth/login
///
/// Any credentials are accepted; the cookie only satisfies clients that
/// insist on a session.
pub async fn login() -> impl IntoResponse {
    let sid = uuid::Uuid::new_v4().simple().to_string();
    (
        [(
            header::SET_COOKIE,
            format!("SID={}; HttpOnly; SameSite=Strict; path=/", sid),
        )],
        ok(),
    )
}

/// POST /api/v2/auth/logout
pub async fn logout() -> &'static str {
    ok()
}

/// GET /api/v2/app/version
pub async fn app_version() -> &'static str {
    APP_VERSION
}

/// GET /api/v2/app/webapiVersion
pub async fn web_api_version() -> &'static str {
    WEB_API_VERSION
}

/// GET /api/v2/app/preferences
///
/// Seeding limits are reported disabled so clients never try to enforce them.
pub async fn preferences(State(state): State<Arc<AppState>>) -> Json<Preferences> {
    Json(Preferences {
        save_path: state.controller().default_save_path().to_string(),
        temp_path_enabled: false,
        max_ratio_enabled: false,
        max_ratio: -1.0,
        max_ratio_act: 0,
        max_seeding_time_enabled: false,
        max_seeding_time: -1,
        queueing_enabled: false,
        dht: false,
        auto_tmm_enabled: false,
    })
}

// ============================================================================
// Torrents
// ============================================================================

/// GET /api/v2/torrents/info
pub async fn list_torrents(
    State(state): State<Arc<AppState>>,
    Query(params): Query<InfoParams>,
) -> Result<Json<Vec<TorrentInfo>>, QbtError> {
    let category = params.category.as_deref().filter(|c| !c.is_empty());
    let mut torrents = state.controller().list(category).await?;

    if let Some(wanted) = params
        .hashes
        .as_deref()
        .map(parse_hash_filter)
        .filter(|w| !w.is_empty())
    {
        torrents.retain(|t| wanted.iter().any(|h| matches_hash(&t.hash, h)));
    }

    Ok(Json(torrents))
}

/// Lowercased hashes; empty when the caller asked for `all`.
fn parse_hash_filter(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(|h| h.trim().to_lowercase())
        .filter(|h| !h.is_empty() && h != "all")
        .collect()
}

fn matches_hash(listed: &str, wanted: &str) -> bool {
    listed == wanted || listed.strip_suffix("00000000") == Some(wanted)
}

/// POST /api/v2/torrents/add
///
/// Accepts `multipart/form-data` (what qBittorrent's own UI and most *arr
/// apps send) or `application/x-www-form-urlencoded`.
pub async fn add_torrents(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, QbtError> {
    let form = read_add_form(request, &state).await?;

    let outcome = state
        .controller()
        .add(&form.urls, form.category.as_deref())
        .await?;
    record_add(&outcome);

    if outcome.all_succeeded() {
        Ok(ok().into_response())
    } else {
        Ok("Fail.".into_response())
    }
}

async fn read_add_form(request: Request, state: &Arc<AppState>) -> Result<AddForm, QbtError> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if !is_multipart {
        let Form(form) = Form::<AddForm>::from_request(request, state)
            .await
            .map_err(|e| QbtError(StatusCode::BAD_REQUEST, e.body_text()))?;
        return Ok(form);
    }

    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|e| QbtError(StatusCode::BAD_REQUEST, e.body_text()))?;

    let mut form = AddForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| QbtError(StatusCode::BAD_REQUEST, e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "urls" | "category" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| QbtError(StatusCode::BAD_REQUEST, e.body_text()))?;
                if name == "urls" {
                    form.urls = value;
                } else {
                    form.category = Some(value);
                }
            }
            "torrents" => debug!("Ignoring uploaded .torrent file"),
            other => debug!(field = other, "Ignoring add field"),
        }
    }
    Ok(form)
}

/// POST /api/v2/torrents/delete
pub async fn delete_torrents(
    State(state): State<Arc<AppState>>,
    Form(form): Form<DeleteForm>,
) -> Result<&'static str, QbtError> {
    let delete_files = is_truthy(form.delete_files.as_deref());
    let outcome = state.controller().delete(&form.hashes, delete_files).await?;

    let failed = outcome.items.iter().filter(|i| i.error.is_some()).count();
    if failed > 0 {
        info!(failed = failed, "Some deletions failed");
    }
    Ok(ok())
}

/// POST /api/v2/torrents/pause (and `stop`)
pub async fn pause_torrents(
    State(state): State<Arc<AppState>>,
    Form(form): Form<HashesForm>,
) -> Result<&'static str, QbtError> {
    state.controller().pause(&form.hashes).await?;
    Ok(ok())
}

/// POST /api/v2/torrents/resume (and `start`)
pub async fn resume_torrents(
    State(state): State<Arc<AppState>>,
    Form(form): Form<HashesForm>,
) -> Result<&'static str, QbtError> {
    state.controller().resume(&form.hashes).await?;
    Ok(ok())
}

/// GET /api/v2/torrents/categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Json<BTreeMap<String, CategoryEntry>> {
    let categories = state.controller().categories().all().await;
    Json(
        categories
            .into_iter()
            .map(|c| {
                (
                    c.label.clone(),
                    CategoryEntry {
                        name: c.label,
                        save_path: c.path,
                    },
                )
            })
            .collect(),
    )
}

/// POST /api/v2/torrents/createCategory, /api/v2/torrents/setCategory
///
/// Categories come from configuration; these only acknowledge.
pub async fn acknowledge_category() -> &'static str {
    ok()
}

/// GET /api/v2/torrents/properties?hash=
pub async fn torrent_properties(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashParam>,
) -> Result<Json<TorrentProperties>, QbtError> {
    let torrent = find_torrent(&state, &params.hash).await?;
    Ok(Json(TorrentProperties::from(&torrent)))
}

/// GET /api/v2/torrents/files?hash=
pub async fn torrent_files(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashParam>,
) -> Result<Json<Vec<TorrentFile>>, QbtError> {
    let torrent = find_torrent(&state, &params.hash).await?;
    Ok(Json(vec![TorrentFile::from(&torrent)]))
}

async fn find_torrent(state: &AppState, hash: &str) -> Result<TorrentInfo, QbtError> {
    state
        .controller()
        .find(hash)
        .await?
        .ok_or_else(|| QbtError(StatusCode::NOT_FOUND, "Torrent hash was not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hash_filter() {
        assert!(parse_hash_filter("all").is_empty());
        assert_eq!(parse_hash_filter("AB|cd| "), vec!["ab", "cd"]);
    }

    #[test]
    fn test_matches_hash_accepts_native_form() {
        let native = "0123456789abcdef0123456789abcdef";
        let borrowed = format!("{}00000000", native);
        assert!(matches_hash(&borrowed, &borrowed));
        assert!(matches_hash(&borrowed, native));
        assert!(!matches_hash(native, &borrowed));
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy(Some("true")));
        assert!(is_truthy(Some("TRUE")));
        assert!(!is_truthy(Some("false")));
        assert!(!is_truthy(None));
    }

    #[test]
    fn test_controller_error_status_mapping() {
        let QbtError(status, _) = ControllerError::BackendUnavailable.into();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let QbtError(status, _) = ControllerError::Validation("x".into()).into();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

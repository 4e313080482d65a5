//! Emulated Torznab indexer endpoint.
//!
//! One endpoint dispatched on `t`. Whatever goes wrong during a search, the
//! caller still receives a parseable feed.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, error};

use mulearr_core::{search::error_xml, SearchError, SearchKind, SearchRequest};

use super::middleware::AuthUser;
use crate::metrics::{record_search, SEARCH_FAILURES_TOTAL};
use crate::state::AppState;

const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";

/// Torznab query parameters. Numbers are kept as text and parsed leniently;
/// `cat` and the id filters only influence whether a search has facets.
#[derive(Debug, Default, Deserialize)]
pub struct TorznabParams {
    #[serde(default)]
    pub t: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub ep: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub offset: Option<String>,
    #[serde(default)]
    pub cat: Option<String>,
    #[serde(default)]
    pub tvdbid: Option<String>,
    #[serde(default)]
    pub rid: Option<String>,
    #[serde(default)]
    pub imdbid: Option<String>,
    #[serde(default)]
    pub tmdbid: Option<String>,
    #[serde(default)]
    pub tvmazeid: Option<String>,
}

impl TorznabParams {
    fn has_id_filters(&self) -> bool {
        [
            &self.tvdbid,
            &self.rid,
            &self.imdbid,
            &self.tmdbid,
            &self.tvmazeid,
        ]
        .into_iter()
        .any(|v| v.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }

    pub fn to_request(&self, kind: SearchKind) -> SearchRequest {
        let mut request = SearchRequest::new(kind, self.q.as_deref());
        request.season = self.season.clone();
        request.episode = self.ep.clone();
        request.limit = parse_number(self.limit.as_deref());
        request.offset = parse_number(self.offset.as_deref()).unwrap_or(0);
        request.has_id_filters = self.has_id_filters();
        request
    }
}

fn parse_number(value: Option<&str>) -> Option<u32> {
    value.and_then(|v| v.trim().parse().ok())
}

fn xml_response(status: StatusCode, content_type: &'static str, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, content_type)], body).into_response()
}

/// GET /api, GET /torznab/api
pub async fn torznab_api(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(params): Query<TorznabParams>,
) -> Response {
    let Some(t) = params.t.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
        return xml_response(
            StatusCode::BAD_REQUEST,
            XML_CONTENT_TYPE,
            error_xml(200, "Missing parameter (t)"),
        );
    };

    if t.eq_ignore_ascii_case("caps") {
        return xml_response(StatusCode::OK, XML_CONTENT_TYPE, state.feed().caps());
    }

    let Some(kind) = SearchKind::from_torznab(t) else {
        debug!(t = t, "Unsupported Torznab function");
        return xml_response(
            StatusCode::BAD_REQUEST,
            XML_CONTENT_TYPE,
            error_xml(202, "No such function"),
        );
    };

    let request = params.to_request(kind);
    debug!(
        user = %user,
        kind = kind.as_str(),
        q = request.query_text().unwrap_or(""),
        season = request.season.as_deref().unwrap_or(""),
        ep = request.episode.as_deref().unwrap_or(""),
        cat = params.cat.as_deref().unwrap_or(""),
        "Torznab search"
    );

    // Runs detached so a caller hanging up does not abort a rate-limited
    // backend search halfway through.
    let gateway = state.gateway();
    let task_request = request.clone();
    let result = tokio::spawn(async move { gateway.search(&task_request).await })
        .await
        .unwrap_or_else(|e| Err(SearchError::Internal(e.to_string())));

    match result {
        Ok(outcome) => {
            record_search(&outcome);
            let body = state
                .feed()
                .feed(&outcome.hits, request.offset, outcome.total, Utc::now());
            xml_response(StatusCode::OK, RSS_CONTENT_TYPE, body)
        }
        Err(e) => {
            SEARCH_FAILURES_TOTAL.inc();
            error!(error = %e, kind = kind.as_str(), "Search failed, returning empty feed");
            xml_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                RSS_CONTENT_TYPE,
                state.feed().empty_feed(),
            )
        }
    }
}

//! Types for the Torznab search gateway.

use serde::Serialize;
use thiserror::Error;

use crate::backend::{BackendError, SearchHit};

/// Errors that can occur during a search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Backend search failed: {0}")]
    Upstream(#[from] BackendError),

    #[error("Internal search error: {0}")]
    Internal(String),
}

/// Torznab search function (`t=` parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Search,
    TvSearch,
    Movie,
}

impl SearchKind {
    /// Parse a Torznab `t` value. `caps` is not a search kind.
    pub fn from_torznab(t: &str) -> Option<Self> {
        match t.to_ascii_lowercase().as_str() {
            "search" => Some(SearchKind::Search),
            "tvsearch" | "tv-search" => Some(SearchKind::TvSearch),
            "movie" | "movie-search" | "moviesearch" => Some(SearchKind::Movie),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Search => "search",
            SearchKind::TvSearch => "tvsearch",
            SearchKind::Movie => "movie",
        }
    }
}

/// A parsed Torznab search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub kind: SearchKind,
    pub query: Option<String>,
    pub season: Option<String>,
    pub episode: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
    /// Any of tvdbid, rid, imdbid (or similar) was supplied.
    pub has_id_filters: bool,
}

impl SearchRequest {
    pub fn new(kind: SearchKind, query: Option<&str>) -> Self {
        Self {
            kind,
            query: query.map(str::to_string),
            season: None,
            episode: None,
            limit: None,
            offset: 0,
            has_id_filters: false,
        }
    }

    /// Free text, ignoring blank values.
    pub fn query_text(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    pub fn has_structured_filters(&self) -> bool {
        non_blank(&self.season) || non_blank(&self.episode) || self.has_id_filters
    }
}

fn non_blank(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Cache key for merged results.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: SearchKind,
    pub query: String,
    pub season: Option<String>,
    pub episode: Option<String>,
}

/// Result of a gateway search, already paginated.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub hits: Vec<SearchHit>,
    /// Merged result count before pagination.
    pub total: usize,
    pub cache_hit: bool,
    /// Backend queries issued for this request.
    pub queries_issued: usize,
}

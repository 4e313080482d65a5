//! Query planning: normalization, year stripping and season/episode variants.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::types::{CacheKey, SearchKind, SearchRequest};

/// Four-digit year 1900-2099 with optional surrounding brackets.
static YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\(\[]?\b(?:19|20)\d{2}\b[\)\]]?").unwrap());

/// The backend queries needed for one request and the key their merged
/// result is cached under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub key: CacheKey,
    pub variants: Vec<String>,
}

/// Remove air years; an un-indexed text search rarely matches them.
pub fn strip_year(query: &str) -> String {
    collapse_whitespace(&YEAR.replace_all(query, " "))
}

/// Lowercase and collapse whitespace.
pub fn normalize_query(query: &str) -> String {
    collapse_whitespace(&query.to_lowercase())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Numeric values lose leading zeros ("01" -> "1"); others are trimmed.
fn canonical_number(value: &str) -> String {
    let value = value.trim();
    match value.parse::<u32>() {
        Ok(n) => n.to_string(),
        Err(_) => value.to_string(),
    }
}

/// Two-digit padding for numeric values.
fn pad2(value: &str) -> String {
    match value.parse::<u32>() {
        Ok(n) => format!("{:02}", n),
        Err(_) => value.to_string(),
    }
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| canonical_number(v))
        .filter(|v| !v.is_empty())
}

/// Build the plan for a request that carries free text.
///
/// Returns `None` when the request has no query text.
pub fn plan_queries(request: &SearchRequest) -> Option<QueryPlan> {
    let text = request.query_text()?;

    let season = non_blank(request.season.as_ref());
    let episode = non_blank(request.episode.as_ref());

    let (season, episode) = match request.kind {
        SearchKind::Movie => (None, None),
        _ => (season, episode),
    };

    let Some(season) = season else {
        return Some(QueryPlan {
            key: CacheKey {
                kind: request.kind,
                query: normalize_query(text),
                season: None,
                episode,
            },
            variants: vec![text.to_string()],
        });
    };

    let name = match strip_year(text) {
        stripped if stripped.is_empty() => collapse_whitespace(text),
        stripped => stripped,
    };
    let variants = match &episode {
        Some(ep) => vec![
            format!("{} {}x{}", name, season, pad2(ep)),
            format!("{} S{}E{}", name, pad2(&season), pad2(ep)),
        ],
        None => vec![
            format!("{} {}x", name, season),
            format!("{} S{}", name, pad2(&season)),
        ],
    };

    Some(QueryPlan {
        key: CacheKey {
            kind: request.kind,
            query: normalize_query(&name),
            season: Some(season),
            episode,
        },
        variants,
    })
}

//! Torznab search over the ed2k backend.
//!
//! `SearchGateway` turns faceted Torznab requests into plain-text backend
//! queries, caches the merged results and keeps backend searches spaced
//! apart. `SearchFeedBuilder` renders the results.

mod cache;
mod dedup;
mod feed;
mod gateway;
mod query;
mod rate_limiter;
mod types;

pub use cache::SearchCache;
pub use dedup::merge_hits;
pub use feed::{error_xml, xml_escape, SearchFeedBuilder, CATEGORY_TREES, DEFAULT_SUBCATEGORY};
pub use gateway::{probe_hit, SearchGateway, PROBE_CATEGORY, PROBE_HASH};
pub use query::{normalize_query, plan_queries, strip_year, QueryPlan};
pub use rate_limiter::MinIntervalLimiter;
pub use types::*;

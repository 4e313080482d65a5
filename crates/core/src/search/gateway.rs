//! Search gateway: query planning, caching and rate limiting in front of
//! the backend search.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::Duration;
use tracing::{debug, info};

use crate::backend::{MuleBackend, SearchHit};
use crate::config::SearchConfig;

use super::cache::SearchCache;
use super::dedup::merge_hits;
use super::query::plan_queries;
use super::rate_limiter::MinIntervalLimiter;
use super::types::{SearchError, SearchOutcome, SearchRequest};

/// Hash of the synthetic hit served to indexer validation probes
/// (MD4 of the empty string).
pub const PROBE_HASH: &str = "31d6cfe0d16ae931b73c59d7e0c089c0";

/// Torznab subcategory of the synthetic probe hit.
pub const PROBE_CATEGORY: u32 = 5040;

pub fn probe_hit() -> SearchHit {
    SearchHit {
        native_hash: PROBE_HASH.to_string(),
        display_name: "mulearr indexer test".to_string(),
        size_bytes: 1,
        source_count: 1,
        category_id: Some(PROBE_CATEGORY),
    }
}

/// Owns the result cache and the process-wide search rate limiter.
pub struct SearchGateway {
    backend: Arc<dyn MuleBackend>,
    limiter: MinIntervalLimiter,
    cache: SearchCache,
    /// Held while fetching so concurrent misses for one key fetch once.
    fetch_lock: Mutex<()>,
    max_results: u32,
}

impl SearchGateway {
    pub fn new(backend: Arc<dyn MuleBackend>, config: &SearchConfig) -> Self {
        Self {
            backend,
            limiter: MinIntervalLimiter::new(Duration::from_millis(config.min_interval_ms)),
            cache: SearchCache::new(Duration::from_millis(config.cache_ttl_ms)),
            fetch_lock: Mutex::new(()),
            max_results: config.max_results,
        }
    }

    pub fn max_results(&self) -> u32 {
        self.max_results
    }

    /// Run a search and return the requested page.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome, SearchError> {
        let Some(plan) = plan_queries(request) else {
            if request.has_structured_filters() {
                debug!(kind = request.kind.as_str(), "Filters without query text, no search");
                return Ok(SearchOutcome::default());
            }
            debug!("Answering indexer validation probe");
            return Ok(SearchOutcome {
                hits: vec![probe_hit()],
                total: 1,
                ..Default::default()
            });
        };

        if let Some(hits) = self.cache.get(&plan.key).await {
            debug!(query = %plan.key.query, "Search cache hit");
            return Ok(self.paginate(hits, request, true, 0));
        }

        let _fetching = self.fetch_lock.lock().await;

        // Another request may have filled the entry while we waited.
        if let Some(hits) = self.cache.get(&plan.key).await {
            debug!(query = %plan.key.query, "Search cache hit after wait");
            return Ok(self.paginate(hits, request, true, 0));
        }

        debug!(query = %plan.key.query, variants = plan.variants.len(), "Search cache miss");

        let mut batches = Vec::with_capacity(plan.variants.len());
        for variant in &plan.variants {
            let response = self
                .limiter
                .run(|| self.backend.search(variant))
                .await?;
            debug!(variant = %variant, hits = response.hits.len(), "Backend search finished");
            batches.push(response.hits);
        }

        let merged = merge_hits(batches);
        info!(
            query = %plan.key.query,
            kind = request.kind.as_str(),
            results = merged.len(),
            "Search completed"
        );
        self.cache.insert(plan.key, merged.clone()).await;

        Ok(self.paginate(merged, request, false, plan.variants.len()))
    }

    fn paginate(
        &self,
        hits: Vec<SearchHit>,
        request: &SearchRequest,
        cache_hit: bool,
        queries_issued: usize,
    ) -> SearchOutcome {
        let total = hits.len();
        let limit = request
            .limit
            .unwrap_or(self.max_results)
            .min(self.max_results) as usize;
        let hits = hits
            .into_iter()
            .skip(request.offset as usize)
            .take(limit)
            .collect();

        SearchOutcome {
            hits,
            total,
            cache_hit,
            queries_issued,
        }
    }
}

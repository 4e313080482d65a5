//! Mock ed2k backend for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::backend::{
    BackendError, DownloadRecord, MuleBackend, SearchHit, SearchResponse, SharedFileRecord,
};

/// A recorded backend search call.
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    pub query: String,
    pub started_at: Instant,
    pub completed_at: Instant,
}

/// Mock implementation of the `MuleBackend` trait.
///
/// - Records added links, cancelled hashes and search calls
/// - Serves scripted downloads, shared files and search hits
/// - Simulates disconnection, refusals and one-shot failures
///
/// # Example
///
/// ```rust,ignore
/// let backend = MockBackend::new();
/// backend.set_search_results("show 1x01", vec![fixtures::search_hit("Show 1x01", HASH)]).await;
///
/// let response = backend.search("show 1x01").await?;
/// assert_eq!(backend.search_calls().await.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockBackend {
    connected: Arc<RwLock<bool>>,
    downloads: Arc<RwLock<Vec<DownloadRecord>>>,
    shared: Arc<RwLock<Vec<SharedFileRecord>>>,
    /// Hits by exact query text.
    search_results: Arc<RwLock<HashMap<String, Vec<SearchHit>>>>,
    /// Hits for queries without a scripted entry.
    default_hits: Arc<RwLock<Vec<SearchHit>>>,
    search_delay: Arc<RwLock<Duration>>,
    add_result: Arc<RwLock<bool>>,
    cancel_result: Arc<RwLock<bool>>,
    added: Arc<RwLock<Vec<(String, u32)>>>,
    cancelled: Arc<RwLock<Vec<String>>>,
    searches: Arc<RwLock<Vec<RecordedSearch>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<BackendError>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a connected mock backend with no content.
    pub fn new() -> Self {
        Self {
            connected: Arc::new(RwLock::new(true)),
            downloads: Arc::new(RwLock::new(Vec::new())),
            shared: Arc::new(RwLock::new(Vec::new())),
            search_results: Arc::new(RwLock::new(HashMap::new())),
            default_hits: Arc::new(RwLock::new(Vec::new())),
            search_delay: Arc::new(RwLock::new(Duration::ZERO)),
            add_result: Arc::new(RwLock::new(true)),
            cancel_result: Arc::new(RwLock::new(true)),
            added: Arc::new(RwLock::new(Vec::new())),
            cancelled: Arc::new(RwLock::new(Vec::new())),
            searches: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn set_connected(&self, connected: bool) {
        *self.connected.write().await = connected;
    }

    pub async fn set_downloads(&self, downloads: Vec<DownloadRecord>) {
        *self.downloads.write().await = downloads;
    }

    pub async fn set_shared(&self, shared: Vec<SharedFileRecord>) {
        *self.shared.write().await = shared;
    }

    /// Script the hits returned for an exact query.
    pub async fn set_search_results(&self, query: &str, hits: Vec<SearchHit>) {
        self.search_results
            .write()
            .await
            .insert(query.to_string(), hits);
    }

    /// Hits returned for any query without a scripted entry.
    pub async fn set_default_search_results(&self, hits: Vec<SearchHit>) {
        *self.default_hits.write().await = hits;
    }

    /// Simulated duration of each search call.
    pub async fn set_search_delay(&self, delay: Duration) {
        *self.search_delay.write().await = delay;
    }

    /// Whether `add_native_link` reports acceptance.
    pub async fn set_add_result(&self, accepted: bool) {
        *self.add_result.write().await = accepted;
    }

    /// Whether `cancel` reports acknowledgement.
    pub async fn set_cancel_result(&self, acknowledged: bool) {
        *self.cancel_result.write().await = acknowledged;
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: BackendError) {
        *self.next_error.write().await = Some(error);
    }

    /// Recorded `(link, category_id)` pairs, in call order.
    pub async fn added_links(&self) -> Vec<(String, u32)> {
        self.added.read().await.clone()
    }

    pub async fn cancelled_hashes(&self) -> Vec<String> {
        self.cancelled.read().await.clone()
    }

    pub async fn search_calls(&self) -> Vec<RecordedSearch> {
        self.searches.read().await.clone()
    }

    pub async fn clear_recorded(&self) {
        self.added.write().await.clear();
        self.cancelled.write().await.clear();
        self.searches.write().await.clear();
    }

    async fn take_error(&self) -> Option<BackendError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl MuleBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn is_connected(&self) -> bool {
        *self.connected.read().await
    }

    async fn list_active_downloads(&self) -> Result<Vec<DownloadRecord>, BackendError> {
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        Ok(self.downloads.read().await.clone())
    }

    async fn list_shared_files(&self) -> Result<Vec<SharedFileRecord>, BackendError> {
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        Ok(self.shared.read().await.clone())
    }

    async fn add_native_link(&self, link: &str, category_id: u32) -> Result<bool, BackendError> {
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        self.added
            .write()
            .await
            .push((link.to_string(), category_id));
        Ok(*self.add_result.read().await)
    }

    async fn cancel(&self, native_hash: &str) -> Result<bool, BackendError> {
        self.cancelled.write().await.push(native_hash.to_string());
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        Ok(*self.cancel_result.read().await)
    }

    async fn search(&self, query: &str) -> Result<SearchResponse, BackendError> {
        let started_at = Instant::now();
        let delay = *self.search_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = match self.take_error().await {
            Some(error) => Err(error),
            None => {
                let hits = match self.search_results.read().await.get(query) {
                    Some(hits) => hits.clone(),
                    None => self.default_hits.read().await.clone(),
                };
                Ok(SearchResponse { hits })
            }
        };

        self.searches.write().await.push(RecordedSearch {
            query: query.to_string(),
            started_at,
            completed_at: Instant::now(),
        });
        result
    }
}

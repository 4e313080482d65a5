//! Types for the ed2k backend collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Backend is not connected")]
    NotConnected,

    #[error("Backend API error: {0}")]
    ApiError(String),

    #[error("Backend request timeout")]
    Timeout,
}

/// An entry in the backend's download queue.
///
/// The backend has reported these fields under two naming schemes over
/// time; the aliases fold both into one shape here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRecord {
    #[serde(alias = "fileHash", alias = "file_hash")]
    pub hash: String,
    #[serde(alias = "fileName", alias = "file_name")]
    pub name: String,
    #[serde(alias = "sizeFull", alias = "size")]
    pub size_full: u64,
    #[serde(default, alias = "sizeDone", alias = "completed")]
    pub size_done: u64,
    #[serde(default, alias = "downloadSpeed", alias = "dlspeed")]
    pub speed: u64,
    #[serde(default, alias = "sourceCount", alias = "sources")]
    pub source_count: u32,
    #[serde(default, alias = "downPrio", alias = "prio")]
    pub priority: i32,
    #[serde(default, alias = "cat", alias = "categoryId")]
    pub category: u32,
}

/// A completed file the backend is sharing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedFileRecord {
    #[serde(alias = "fileHash", alias = "file_hash")]
    pub hash: String,
    #[serde(alias = "fileName", alias = "file_name")]
    pub name: String,
    #[serde(alias = "sizeFull", alias = "size_full")]
    pub size: u64,
    #[serde(default, alias = "cat", alias = "categoryId")]
    pub category: u32,
}

/// One result of a backend text search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(alias = "hash", alias = "fileHash")]
    pub native_hash: String,
    #[serde(alias = "name", alias = "fileName")]
    pub display_name: String,
    #[serde(alias = "size", alias = "sizeFull")]
    pub size_bytes: u64,
    #[serde(default, alias = "sources", alias = "sourceCount")]
    pub source_count: u32,
    /// Torznab subcategory, when the backend can tell.
    #[serde(default, alias = "category", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u32>,
}

/// Payload of a backend search call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

/// The five operations this bridge needs from an ed2k backend.
#[async_trait]
pub trait MuleBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Whether the backend connection is established.
    async fn is_connected(&self) -> bool;

    async fn list_active_downloads(&self) -> Result<Vec<DownloadRecord>, BackendError>;

    async fn list_shared_files(&self) -> Result<Vec<SharedFileRecord>, BackendError>;

    /// Queue an ed2k link. Returns whether the backend accepted it.
    async fn add_native_link(&self, link: &str, category_id: u32) -> Result<bool, BackendError>;

    /// Cancel a download by native hash. Returns whether the backend acknowledged it.
    async fn cancel(&self, native_hash: &str) -> Result<bool, BackendError>;

    /// Run a text search and wait for its results.
    async fn search(&self, query: &str) -> Result<SearchResponse, BackendError>;
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HashStoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid hash mapping: {0}")]
    InvalidHash(String),
}

/// One native hash <-> borrowed hash pairing, created when a caller adds content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashIdentityMapping {
    pub native_hash: String,
    pub borrowed_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_label: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Optional metadata stored alongside a mapping.
#[derive(Debug, Clone, Default)]
pub struct MappingMetadata {
    pub display_name: Option<String>,
    pub category_label: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Persistent bidirectional table of hash identities.
///
/// All hashes are lowercased on write and lookup.
pub trait HashIdentityStore: Send + Sync {
    /// Insert or replace the mapping for `native_hash`.
    fn store(
        &self,
        native_hash: &str,
        borrowed_hash: &str,
        metadata: MappingMetadata,
    ) -> Result<(), HashStoreError>;

    /// Full mapping for a native hash.
    fn get(&self, native_hash: &str) -> Result<Option<HashIdentityMapping>, HashStoreError>;

    fn lookup_borrowed(&self, native_hash: &str) -> Result<Option<String>, HashStoreError> {
        Ok(self.get(native_hash)?.map(|m| m.borrowed_hash))
    }

    fn lookup_native(&self, borrowed_hash: &str) -> Result<Option<String>, HashStoreError>;

    /// Remove the mapping for `native_hash`. Returns whether a row existed.
    fn remove(&self, native_hash: &str) -> Result<bool, HashStoreError>;

    /// All mappings, newest first.
    fn all(&self) -> Result<Vec<HashIdentityMapping>, HashStoreError>;

    /// Delete mappings created more than `days` days ago. Returns the number removed.
    fn purge_older_than(&self, days: u32) -> Result<usize, HashStoreError>;
}

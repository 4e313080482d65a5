//! Download controller: the qBittorrent torrent operations mapped onto the
//! ed2k backend.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::{BackendError, MuleBackend};
use crate::category::{Category, CategoryLookup};
use crate::identity::{
    borrowed_hash_for, borrowed_to_native, format_native_link, parse_native_link,
    ConversionError, DecodedLink, HashIdentityStore, MappingMetadata,
};

use super::adapter::{to_torrent_info, BackendEntry, TransferRecord};
use super::types::{ControllerError, TorrentInfo};

/// Why a single link in an add batch failed.
#[derive(Debug, Error)]
pub enum AddItemError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("Backend refused the link")]
    Rejected,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Result for one link of an add batch.
#[derive(Debug)]
pub struct AddItemResult {
    pub link: String,
    /// Borrowed hash of the added content on success.
    pub result: Result<String, AddItemError>,
}

/// Per-item results of an add batch, in input order.
#[derive(Debug, Default)]
pub struct AddOutcome {
    pub items: Vec<AddItemResult>,
}

impl AddOutcome {
    /// True only if every link was added.
    pub fn all_succeeded(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|i| i.result.is_ok())
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }
}

/// Result for one hash of a delete batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteItemResult {
    /// Hash as given by the caller.
    pub hash: String,
    /// Hash sent to the backend.
    pub native_hash: String,
    pub cancelled: bool,
    pub mapping_removed: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct DeleteOutcome {
    pub items: Vec<DeleteItemResult>,
}

/// Implements list/add/delete/pause/resume over the backend, the hash store
/// and the category lookup.
pub struct DownloadController {
    backend: Arc<dyn MuleBackend>,
    store: Arc<dyn HashIdentityStore>,
    categories: Arc<dyn CategoryLookup>,
    default_category_id: u32,
    default_save_path: String,
}

impl DownloadController {
    pub fn new(
        backend: Arc<dyn MuleBackend>,
        store: Arc<dyn HashIdentityStore>,
        categories: Arc<dyn CategoryLookup>,
        default_category_id: u32,
        default_save_path: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            store,
            categories,
            default_category_id,
            default_save_path: default_save_path.into(),
        }
    }

    pub fn categories(&self) -> &Arc<dyn CategoryLookup> {
        &self.categories
    }

    pub fn default_save_path(&self) -> &str {
        &self.default_save_path
    }

    /// All transfers, optionally limited to one category label.
    pub async fn list(
        &self,
        category_filter: Option<&str>,
    ) -> Result<Vec<TorrentInfo>, ControllerError> {
        if !self.backend.is_connected().await {
            return Err(ControllerError::BackendUnavailable);
        }

        let (active, shared) = futures::try_join!(
            self.backend.list_active_downloads(),
            self.backend.list_shared_files()
        )?;

        // A finished download can show up in both lists; the queue entry wins.
        let mut seen = HashSet::new();
        let records: Vec<TransferRecord> = active
            .into_iter()
            .map(BackendEntry::Active)
            .chain(shared.into_iter().map(BackendEntry::Shared))
            .map(TransferRecord::from)
            .filter(|r| seen.insert(r.native_hash.clone()))
            .collect();

        let mut mappings = Vec::with_capacity(records.len());
        for record in &records {
            mappings.push(self.store.get(&record.native_hash)?);
        }

        let categories = join_all(records.iter().zip(&mappings).map(|(record, mapping)| {
            let label = mapping.as_ref().and_then(|m| m.category_label.clone());
            self.resolve_category(record.category_id, label)
        }))
        .await;

        let torrents = records
            .iter()
            .zip(mappings.iter())
            .zip(categories.iter())
            .map(|((record, mapping), category)| {
                to_torrent_info(
                    record,
                    mapping.as_ref(),
                    category.as_ref(),
                    &self.default_save_path,
                )
            })
            .filter(|t| match category_filter {
                Some(label) => t.category.eq_ignore_ascii_case(label),
                None => true,
            })
            .collect::<Vec<_>>();

        debug!(
            count = torrents.len(),
            category = category_filter.unwrap_or(""),
            "Listed transfers"
        );
        Ok(torrents)
    }

    /// Find one transfer by borrowed or native hash.
    pub async fn find(&self, hash: &str) -> Result<Option<TorrentInfo>, ControllerError> {
        let wanted = hash.trim().to_ascii_lowercase();
        let padded = borrowed_hash_for(&wanted);
        Ok(self
            .list(None)
            .await?
            .into_iter()
            .find(|t| t.hash == wanted || t.hash == padded))
    }

    /// Add newline-separated links under an optional category label.
    pub async fn add(
        &self,
        links_blob: &str,
        category_label: Option<&str>,
    ) -> Result<AddOutcome, ControllerError> {
        let links: Vec<&str> = links_blob
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if links.is_empty() {
            return Err(ControllerError::Validation("No links provided".to_string()));
        }

        let category_label = category_label.map(str::trim).filter(|l| !l.is_empty());
        let category_id = self.category_id_for(category_label).await;

        let mut outcome = AddOutcome::default();
        for link in links {
            let result = self.add_one(link, category_id, category_label).await?;
            if let Err(e) = &result {
                warn!(link = link, error = %e, "Failed to add link");
            }
            outcome.items.push(AddItemResult {
                link: link.to_string(),
                result,
            });
        }

        info!(
            succeeded = outcome.succeeded(),
            failed = outcome.failed(),
            category_id = category_id,
            "Processed add request"
        );
        Ok(outcome)
    }

    /// Store faults are returned as the outer error; everything else is a
    /// per-item result.
    async fn add_one(
        &self,
        link: &str,
        category_id: u32,
        category_label: Option<&str>,
    ) -> Result<Result<String, AddItemError>, ControllerError> {
        let decoded = match decode_link(link) {
            Ok(decoded) => decoded,
            Err(e) => return Ok(Err(e.into())),
        };

        match self
            .backend
            .add_native_link(&decoded.native_link, category_id)
            .await
        {
            Ok(true) => {}
            Ok(false) => return Ok(Err(AddItemError::Rejected)),
            Err(e) => return Ok(Err(e.into())),
        }

        self.store.store(
            &decoded.native_hash,
            &decoded.borrowed_hash,
            MappingMetadata {
                display_name: Some(decoded.name.clone()),
                category_label: category_label.map(str::to_string),
                created_at: Some(Utc::now()),
            },
        )?;

        debug!(
            native_hash = %decoded.native_hash,
            name = %decoded.name,
            "Added download"
        );
        Ok(Ok(decoded.borrowed_hash))
    }

    /// Cancel each hash of a `|`-separated list. Individual failures are
    /// logged and reported per item, never as an error.
    pub async fn delete(
        &self,
        hashes: &str,
        delete_files: bool,
    ) -> Result<DeleteOutcome, ControllerError> {
        let hashes = split_hashes(hashes);
        if hashes.is_empty() {
            return Err(ControllerError::Validation("No hashes provided".to_string()));
        }

        let mut outcome = DeleteOutcome::default();
        for hash in hashes {
            let item = self.delete_one(&hash).await;
            if let Some(error) = &item.error {
                warn!(hash = %hash, error = %error, "Failed to delete transfer");
            }
            outcome.items.push(item);
        }

        info!(
            count = outcome.items.len(),
            delete_files = delete_files,
            "Processed delete request"
        );
        Ok(outcome)
    }

    async fn delete_one(&self, hash: &str) -> DeleteItemResult {
        let mut item = DeleteItemResult {
            hash: hash.to_string(),
            native_hash: hash.to_string(),
            cancelled: false,
            mapping_removed: false,
            error: None,
        };

        let mapped = match self.resolve_native(hash) {
            Ok(Some(native)) => {
                item.native_hash = native;
                true
            }
            Ok(None) => false,
            Err(e) => {
                item.error = Some(e.to_string());
                false
            }
        };

        match self.backend.cancel(&item.native_hash).await {
            Ok(true) => item.cancelled = true,
            Ok(false) => {
                warn!(native_hash = %item.native_hash, "Backend did not acknowledge cancel");
            }
            Err(e) => {
                item.error = Some(e.to_string());
                return item;
            }
        }

        if mapped {
            match self.store.remove(&item.native_hash) {
                Ok(removed) => item.mapping_removed = removed,
                Err(e) => item.error = Some(e.to_string()),
            }
        }

        item
    }

    /// Map a caller-supplied hash to a native hash if a mapping exists.
    fn resolve_native(&self, hash: &str) -> Result<Option<String>, ControllerError> {
        if let Some(native) = self.store.lookup_native(hash)? {
            return Ok(Some(native));
        }
        Ok(self.store.get(hash)?.map(|m| m.native_hash))
    }

    /// The backend has no pause; always succeeds.
    pub async fn pause(&self, hashes: &str) -> Result<(), ControllerError> {
        debug!(hashes = hashes, "Ignoring pause request");
        Ok(())
    }

    /// The backend has no resume; always succeeds.
    pub async fn resume(&self, hashes: &str) -> Result<(), ControllerError> {
        debug!(hashes = hashes, "Ignoring resume request");
        Ok(())
    }

    async fn category_id_for(&self, label: Option<&str>) -> u32 {
        let Some(label) = label else {
            return self.default_category_id;
        };
        match self.categories.by_name(label).await {
            Some(category) => category.id,
            None => {
                warn!(
                    category = label,
                    default_category_id = self.default_category_id,
                    "Unknown category, using default"
                );
                self.default_category_id
            }
        }
    }

    /// Backend category first, then the label recorded when the content was added.
    async fn resolve_category(&self, id: u32, stored_label: Option<String>) -> Option<Category> {
        if let Some(category) = self.categories.by_id(id).await {
            return Some(category);
        }
        let label = stored_label?;
        match self.categories.by_name(&label).await {
            Some(category) => Some(category),
            None => Some(Category {
                id,
                label,
                path: String::new(),
            }),
        }
    }
}

/// Accept magnet links and, for convenience, raw ed2k links.
fn decode_link(link: &str) -> Result<DecodedLink, ConversionError> {
    let is_native = link
        .get(..7)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("ed2k://"));
    if is_native {
        let native = parse_native_link(link)?;
        return Ok(DecodedLink {
            native_link: format_native_link(&native.name, native.size_bytes, &native.hash),
            borrowed_hash: borrowed_hash_for(&native.hash),
            native_hash: native.hash,
            name: native.name,
            size_bytes: native.size_bytes,
        });
    }
    borrowed_to_native(link)
}

fn split_hashes(hashes: &str) -> Vec<String> {
    hashes
        .split('|')
        .map(|h| h.trim().to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

//! Backend record -> `TorrentInfo` translation.

use crate::backend::{DownloadRecord, SharedFileRecord};
use crate::category::Category;
use crate::identity::{native_to_borrowed, HashIdentityMapping};

use super::types::{TorrentInfo, TorrentState, ETA_INFINITE};

/// A raw backend entry before normalization.
#[derive(Debug, Clone)]
pub enum BackendEntry {
    Active(DownloadRecord),
    Shared(SharedFileRecord),
}

/// Single typed transfer record that every consumer works from.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRecord {
    pub native_hash: String,
    pub name: String,
    pub size_total: u64,
    pub size_completed: u64,
    pub speed: u64,
    pub source_count: u32,
    pub priority: i32,
    pub category_id: u32,
}

impl From<BackendEntry> for TransferRecord {
    fn from(entry: BackendEntry) -> Self {
        match entry {
            BackendEntry::Active(d) => TransferRecord {
                native_hash: d.hash.to_lowercase(),
                name: d.name,
                size_total: d.size_full,
                size_completed: d.size_done.min(d.size_full),
                speed: d.speed,
                source_count: d.source_count,
                priority: d.priority,
                category_id: d.category,
            },
            // Shared content is complete by definition.
            BackendEntry::Shared(s) => TransferRecord {
                native_hash: s.hash.to_lowercase(),
                name: s.name,
                size_total: s.size,
                size_completed: s.size,
                speed: 0,
                source_count: 0,
                priority: 0,
                category_id: s.category,
            },
        }
    }
}

impl TransferRecord {
    pub fn progress(&self) -> f64 {
        if self.size_total == 0 {
            return 0.0;
        }
        self.size_completed as f64 / self.size_total as f64
    }
}

/// Derive the transfer state. First match wins.
pub fn derive_state(progress: f64, speed: u64, source_count: u32) -> TorrentState {
    if progress >= 1.0 {
        TorrentState::SeedingComplete
    } else if speed > 0 {
        TorrentState::Downloading
    } else if source_count == 0 {
        TorrentState::StalledNoSources
    } else if source_count > 0 {
        TorrentState::Queued
    } else {
        TorrentState::Paused
    }
}

/// Seconds until completion, or `ETA_INFINITE`.
pub fn compute_eta(total: u64, completed: u64, speed: u64) -> u64 {
    if total <= completed || speed == 0 {
        return ETA_INFINITE;
    }
    (total - completed) / speed
}

/// Build the caller-facing record.
///
/// `mapping` supplies the borrowed hash and add time; without it the native
/// hash is reported as-is. A missing category yields empty label and the
/// default save path.
pub fn to_torrent_info(
    record: &TransferRecord,
    mapping: Option<&HashIdentityMapping>,
    category: Option<&Category>,
    default_save_path: &str,
) -> TorrentInfo {
    let progress = record.progress();
    let state = derive_state(progress, record.speed, record.source_count);
    let complete = state.is_complete();

    let hash = mapping
        .map(|m| m.borrowed_hash.clone())
        .unwrap_or_else(|| record.native_hash.clone());
    let magnet_uri = native_to_borrowed(&record.native_hash, &record.name, record.size_total).uri;

    let (label, save_path) = match category {
        Some(c) if !c.path.is_empty() => (c.label.clone(), c.path.clone()),
        Some(c) => (c.label.clone(), default_save_path.to_string()),
        None => (String::new(), default_save_path.to_string()),
    };
    let content_path = format!("{}/{}", save_path.trim_end_matches('/'), record.name);

    let added_on = mapping.map(|m| m.created_at.timestamp()).unwrap_or(0);
    let remaining = record.size_total.saturating_sub(record.size_completed);

    TorrentInfo {
        hash,
        name: record.name.clone(),
        size: record.size_total,
        total_size: record.size_total,
        progress: progress.min(1.0),
        dlspeed: record.speed,
        upspeed: 0,
        downloaded: record.size_completed,
        completed: record.size_completed,
        uploaded: 0,
        amount_left: remaining,
        state,
        category: label,
        save_path,
        content_path,
        eta: compute_eta(record.size_total, record.size_completed, record.speed),
        num_seeds: record.source_count,
        num_leechs: 0,
        num_complete: record.source_count,
        num_incomplete: 0,
        ratio: 0.0,
        ratio_limit: -2,
        seeding_time_limit: -2,
        max_ratio: -1,
        max_seeding_time: -1,
        seeding_time: 0,
        time_active: 0,
        added_on,
        completion_on: if complete { added_on } else { 0 },
        priority: record.priority,
        availability: if complete {
            1.0
        } else {
            record.source_count as f64
        },
        dl_limit: -1,
        up_limit: -1,
        tags: String::new(),
        tracker: String::new(),
        magnet_uri,
        auto_tmm: false,
        force_start: false,
        super_seeding: false,
        seq_dl: false,
        f_l_piece_prio: false,
    }
}

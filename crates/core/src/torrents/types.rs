//! Caller-facing torrent types in qBittorrent Web API shape.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::BackendError;
use crate::identity::HashStoreError;

/// ETA reported when no finite estimate exists (100 days in seconds).
pub const ETA_INFINITE: u64 = 8_640_000;

/// Errors surfaced by the download controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Backend is not connected")]
    BackendUnavailable,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Store(#[from] HashStoreError),
}

/// Derived transfer state.
///
/// Serialized as the qBittorrent state string the *arr callers understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TorrentState {
    /// Fully downloaded and shared.
    #[serde(rename = "stalledUP")]
    SeedingComplete,
    /// Receiving data.
    #[serde(rename = "downloading")]
    Downloading,
    /// Nothing to download from.
    #[serde(rename = "stalledDL")]
    StalledNoSources,
    /// Sources known but waiting in the queue.
    #[serde(rename = "queuedDL")]
    Queued,
    #[serde(rename = "pausedDL")]
    Paused,
}

impl TorrentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TorrentState::SeedingComplete => "stalledUP",
            TorrentState::Downloading => "downloading",
            TorrentState::StalledNoSources => "stalledDL",
            TorrentState::Queued => "queuedDL",
            TorrentState::Paused => "pausedDL",
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, TorrentState::SeedingComplete)
    }
}

impl std::fmt::Display for TorrentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of `/api/v2/torrents/info`.
///
/// Fields without a backend equivalent carry qBittorrent's own
/// "unset" conventions (-1 for no limit, -2 for global limit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentInfo {
    /// Borrowed hash, or the native hash when no mapping exists.
    pub hash: String,
    pub name: String,
    pub size: u64,
    pub total_size: u64,
    /// 0.0 - 1.0
    pub progress: f64,
    pub dlspeed: u64,
    pub upspeed: u64,
    pub downloaded: u64,
    pub completed: u64,
    pub uploaded: u64,
    pub amount_left: u64,
    pub state: TorrentState,
    pub category: String,
    pub save_path: String,
    pub content_path: String,
    pub eta: u64,
    pub num_seeds: u32,
    pub num_leechs: u32,
    pub num_complete: u32,
    pub num_incomplete: u32,
    pub ratio: f64,
    pub ratio_limit: i64,
    pub seeding_time_limit: i64,
    pub max_ratio: i64,
    pub max_seeding_time: i64,
    pub seeding_time: u64,
    pub time_active: u64,
    pub added_on: i64,
    pub completion_on: i64,
    pub priority: i32,
    pub availability: f64,
    pub dl_limit: i64,
    pub up_limit: i64,
    pub tags: String,
    pub tracker: String,
    pub magnet_uri: String,
    pub auto_tmm: bool,
    pub force_start: bool,
    pub super_seeding: bool,
    pub seq_dl: bool,
    pub f_l_piece_prio: bool,
}

/// Response of `/api/v2/torrents/properties`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TorrentProperties {
    pub save_path: String,
    pub total_size: u64,
    pub total_downloaded: u64,
    pub total_uploaded: u64,
    pub dl_speed: u64,
    pub up_speed: u64,
    pub eta: u64,
    pub seeds: u32,
    pub peers: u32,
    pub share_ratio: f64,
    pub addition_date: i64,
    pub completion_date: i64,
    pub seeding_time: u64,
    pub time_elapsed: u64,
    pub dl_limit: i64,
    pub up_limit: i64,
    pub pieces_have: u64,
    pub pieces_num: u64,
    pub piece_size: u64,
}

impl From<&TorrentInfo> for TorrentProperties {
    fn from(info: &TorrentInfo) -> Self {
        let complete = info.state.is_complete();
        Self {
            save_path: info.save_path.clone(),
            total_size: info.total_size,
            total_downloaded: info.downloaded,
            total_uploaded: 0,
            dl_speed: info.dlspeed,
            up_speed: 0,
            eta: info.eta,
            seeds: info.num_seeds,
            peers: 0,
            share_ratio: 0.0,
            addition_date: info.added_on,
            completion_date: info.completion_on,
            seeding_time: 0,
            time_elapsed: 0,
            dl_limit: -1,
            up_limit: -1,
            pieces_have: if complete { 1 } else { 0 },
            pieces_num: 1,
            piece_size: info.total_size,
        }
    }
}

/// One entry of `/api/v2/torrents/files`. ed2k links always carry one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TorrentFile {
    pub index: u32,
    pub name: String,
    pub size: u64,
    pub progress: f64,
    pub priority: i32,
    pub is_seed: bool,
    pub availability: f64,
    pub piece_range: [u32; 2],
}

impl From<&TorrentInfo> for TorrentFile {
    fn from(info: &TorrentInfo) -> Self {
        Self {
            index: 0,
            name: info.name.clone(),
            size: info.total_size,
            progress: info.progress,
            priority: 1,
            is_seed: info.state.is_complete(),
            availability: info.availability,
            piece_range: [0, 0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serializes_as_qbittorrent_string() {
        for state in [
            TorrentState::SeedingComplete,
            TorrentState::Downloading,
            TorrentState::StalledNoSources,
            TorrentState::Queued,
            TorrentState::Paused,
        ] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state.as_str()));
        }
    }

    #[test]
    fn test_only_seeding_is_complete() {
        assert!(TorrentState::SeedingComplete.is_complete());
        assert!(!TorrentState::Queued.is_complete());
    }
}

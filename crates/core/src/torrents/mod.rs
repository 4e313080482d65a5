//! Torrent-shaped view of the ed2k download queue.

mod adapter;
mod controller;
mod types;

pub use adapter::{compute_eta, derive_state, to_torrent_info, BackendEntry, TransferRecord};
pub use controller::{
    AddItemError, AddItemResult, AddOutcome, DeleteItemResult, DeleteOutcome, DownloadController,
};
pub use types::*;

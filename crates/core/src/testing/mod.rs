//! Testing utilities and mock implementations.
//!
//! `MockBackend` stands in for the ed2k backend so the controller, the
//! search gateway and the HTTP layer can be tested without a daemon.

mod mock_backend;

pub use mock_backend::{MockBackend, RecordedSearch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::backend::{DownloadRecord, SearchHit, SharedFileRecord};
    use crate::category::{Category, StaticCategories};

    pub const HASH_A: &str = "31d6cfe0d16ae931b73c59d7e0c089c0";
    pub const HASH_B: &str = "0123456789abcdef0123456789abcdef";
    pub const HASH_C: &str = "fedcba9876543210fedcba9876543210";

    /// A search hit with reasonable defaults.
    pub fn search_hit(name: &str, native_hash: &str) -> SearchHit {
        SearchHit {
            native_hash: native_hash.to_string(),
            display_name: name.to_string(),
            size_bytes: 1024 * 1024 * 350,
            source_count: 12,
            category_id: None,
        }
    }

    /// An in-progress download.
    pub fn download(name: &str, native_hash: &str, done: u64, total: u64) -> DownloadRecord {
        DownloadRecord {
            hash: native_hash.to_string(),
            name: name.to_string(),
            size_full: total,
            size_done: done,
            speed: 0,
            source_count: 0,
            priority: 0,
            category: 0,
        }
    }

    pub fn shared_file(name: &str, native_hash: &str, size: u64) -> SharedFileRecord {
        SharedFileRecord {
            hash: native_hash.to_string(),
            name: name.to_string(),
            size,
            category: 0,
        }
    }

    /// The categories a typical *arr setup uses.
    pub fn arr_categories() -> StaticCategories {
        StaticCategories::new(vec![
            Category {
                id: 1,
                label: "sonarr".to_string(),
                path: "/incoming/tv".to_string(),
            },
            Category {
                id: 2,
                label: "radarr".to_string(),
                path: "/incoming/movies".to_string(),
            },
        ])
    }
}

//! SQLite-backed hash identity store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, DatabaseName, OptionalExtension, Row};

use super::codec::{is_hex, HASH_PAD, NATIVE_HASH_LEN};
use super::{HashIdentityMapping, HashIdentityStore, HashStoreError, MappingMetadata};

/// SQLite-backed hash identity store.
pub struct SqliteHashStore {
    conn: Mutex<Connection>,
}

impl SqliteHashStore {
    /// Open (or create) the store at `path`.
    ///
    /// Fails if the location cannot be opened or written; callers treat this
    /// as fatal at startup.
    pub fn new(path: &Path) -> Result<Self, HashStoreError> {
        let conn = Connection::open(path).map_err(|e| HashStoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Self::ensure_writable(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, HashStoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| HashStoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), HashStoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS hash_mappings (
                native_hash TEXT PRIMARY KEY,
                borrowed_hash TEXT NOT NULL UNIQUE,
                display_name TEXT,
                category_label TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_hash_mappings_created_at ON hash_mappings(created_at);
            "#,
        )
        .map_err(|e| HashStoreError::Database(e.to_string()))?;

        Ok(())
    }

    /// SQLite opens an existing file read-only when it lacks write access,
    /// and the schema statements are no-ops on an existing table.
    fn ensure_writable(conn: &Connection) -> Result<(), HashStoreError> {
        let readonly = conn
            .is_readonly(DatabaseName::Main)
            .map_err(|e| HashStoreError::Database(e.to_string()))?;
        if readonly {
            return Err(HashStoreError::Database(
                "database is not writable".to_string(),
            ));
        }
        conn.execute_batch("BEGIN IMMEDIATE; COMMIT;")
            .map_err(|e| HashStoreError::Database(e.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, HashStoreError> {
        self.conn
            .lock()
            .map_err(|_| HashStoreError::Database("connection mutex poisoned".to_string()))
    }

    fn row_to_mapping(row: &Row<'_>) -> rusqlite::Result<HashIdentityMapping> {
        let created_at_str: String = row.get(4)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(HashIdentityMapping {
            native_hash: row.get(0)?,
            borrowed_hash: row.get(1)?,
            display_name: row.get(2)?,
            category_label: row.get(3)?,
            created_at,
        })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT native_hash, borrowed_hash, display_name, category_label, created_at FROM hash_mappings";

/// Fixed-width UTC timestamps so `created_at` compares correctly as text.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn validate_pair(native_hash: &str, borrowed_hash: &str) -> Result<(), HashStoreError> {
    if native_hash.len() != NATIVE_HASH_LEN || !is_hex(native_hash) {
        return Err(HashStoreError::InvalidHash(format!(
            "native hash '{}' is not {} hex characters",
            native_hash, NATIVE_HASH_LEN
        )));
    }
    if borrowed_hash.strip_suffix(HASH_PAD) != Some(native_hash) {
        return Err(HashStoreError::InvalidHash(format!(
            "borrowed hash '{}' is not '{}' followed by {}",
            borrowed_hash, native_hash, HASH_PAD
        )));
    }
    Ok(())
}

impl HashIdentityStore for SqliteHashStore {
    fn store(
        &self,
        native_hash: &str,
        borrowed_hash: &str,
        metadata: MappingMetadata,
    ) -> Result<(), HashStoreError> {
        let native_hash = native_hash.to_ascii_lowercase();
        let borrowed_hash = borrowed_hash.to_ascii_lowercase();
        validate_pair(&native_hash, &borrowed_hash)?;

        let created_at = metadata.created_at.unwrap_or_else(Utc::now);
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO hash_mappings
                (native_hash, borrowed_hash, display_name, category_label, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                native_hash,
                borrowed_hash,
                metadata.display_name,
                metadata.category_label,
                format_timestamp(created_at),
            ],
        )
        .map_err(|e| HashStoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get(&self, native_hash: &str) -> Result<Option<HashIdentityMapping>, HashStoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("{} WHERE native_hash = ?", SELECT_COLUMNS),
            params![native_hash.to_ascii_lowercase()],
            Self::row_to_mapping,
        )
        .optional()
        .map_err(|e| HashStoreError::Database(e.to_string()))
    }

    fn lookup_native(&self, borrowed_hash: &str) -> Result<Option<String>, HashStoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT native_hash FROM hash_mappings WHERE borrowed_hash = ?",
            params![borrowed_hash.to_ascii_lowercase()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| HashStoreError::Database(e.to_string()))
    }

    fn remove(&self, native_hash: &str) -> Result<bool, HashStoreError> {
        let conn = self.lock()?;
        let removed = conn
            .execute(
                "DELETE FROM hash_mappings WHERE native_hash = ?",
                params![native_hash.to_ascii_lowercase()],
            )
            .map_err(|e| HashStoreError::Database(e.to_string()))?;
        Ok(removed > 0)
    }

    fn all(&self) -> Result<Vec<HashIdentityMapping>, HashStoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "{} ORDER BY created_at DESC, native_hash ASC",
                SELECT_COLUMNS
            ))
            .map_err(|e| HashStoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_mapping)
            .map_err(|e| HashStoreError::Database(e.to_string()))?;

        let mappings = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| HashStoreError::Database(e.to_string()))?;
        Ok(mappings)
    }

    fn purge_older_than(&self, days: u32) -> Result<usize, HashStoreError> {
        let cutoff = Utc::now() - Duration::days(i64::from(days));
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM hash_mappings WHERE created_at < ?",
            params![format_timestamp(cutoff)],
        )
        .map_err(|e| HashStoreError::Database(e.to_string()))
    }
}

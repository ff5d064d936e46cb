//! Persistent catalog storage backed by SQLite.
//!
//! Lets a process start with the schemas a previous run fetched. Records
//! carry the catalog format version and the schema version so stale or
//! foreign rows can be recognized on load.

use crate::entry::CacheEntry;
use crate::error::{CacheError, CacheResult};
use odmeta_model::SchemaDocument;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::{debug, warn};

/// Version of the persisted record layout.
pub const CATALOG_FORMAT_VERSION: u32 = 1;

/// One persisted schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedEntry {
    pub canonical_name: String,
    pub version: String,
    pub format_version: u32,
    pub fetched_at_ms: u64,
    pub document: SchemaDocument,
}

impl PersistedEntry {
    pub fn from_entry(entry: &CacheEntry) -> Self {
        let schema = entry.schema();
        Self {
            canonical_name: schema.canonical_name().to_string(),
            version: schema.version().to_string(),
            format_version: CATALOG_FORMAT_VERSION,
            fetched_at_ms: entry.fetched_at_ms(),
            document: schema.to_document(),
        }
    }

    /// True when the record was written by this catalog format and its
    /// version column agrees with the stored document.
    pub fn is_current(&self) -> bool {
        self.format_version == CATALOG_FORMAT_VERSION
            && self.document.version == self.version
            && self.document.name == self.canonical_name
    }
}

/// SQLite store for cached schemas.
pub struct CatalogStore {
    conn: Mutex<Connection>,
}

impl CatalogStore {
    /// Opens (or creates) a catalog store at the given path.
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| CacheError::Storage(format!("failed to open catalog store: {e}")))?;
        Self::with_connection(conn)
    }

    /// Opens an in-memory catalog store.
    pub fn open_in_memory() -> CacheResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            CacheError::Storage(format!("failed to open in-memory catalog store: {e}"))
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> CacheResult<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> CacheResult<()> {
        self.conn
            .lock()
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS schema_cache (
                    canonical TEXT PRIMARY KEY,
                    version TEXT NOT NULL,
                    format_version INTEGER NOT NULL,
                    fetched_at_ms INTEGER NOT NULL,
                    document TEXT NOT NULL
                );
                ",
            )
            .map_err(|e| CacheError::Storage(format!("failed to init catalog schema: {e}")))
    }

    /// Inserts or replaces one record.
    pub fn save(&self, entry: &PersistedEntry) -> CacheResult<()> {
        self.save_all(std::slice::from_ref(entry)).map(|_| ())
    }

    /// Inserts or replaces every record in one transaction.
    pub fn save_all(&self, entries: &[PersistedEntry]) -> CacheResult<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO schema_cache
                 (canonical, version, format_version, fetched_at_ms, document)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for entry in entries {
                let document = serde_json::to_string(&entry.document)
                    .map_err(|e| CacheError::Storage(format!("failed to encode schema: {e}")))?;
                stmt.execute(params![
                    entry.canonical_name,
                    entry.version,
                    entry.format_version,
                    entry.fetched_at_ms as i64,
                    document,
                ])?;
            }
        }
        tx.commit()?;
        debug!("Persisted {} schemas", entries.len());
        Ok(entries.len())
    }

    /// Loads every readable record. Rows whose document fails to decode are
    /// skipped.
    pub fn load(&self) -> CacheResult<Vec<PersistedEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT canonical, version, format_version, fetched_at_ms, document
             FROM schema_cache ORDER BY canonical",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (canonical_name, version, format_version, fetched_at_ms, document) = row?;
            match serde_json::from_str::<SchemaDocument>(&document) {
                Ok(document) => entries.push(PersistedEntry {
                    canonical_name,
                    version,
                    format_version,
                    fetched_at_ms: fetched_at_ms.max(0) as u64,
                    document,
                }),
                Err(e) => warn!(entity = %canonical_name, error = %e, "Skipping unreadable persisted schema"),
            }
        }
        Ok(entries)
    }

    /// Deletes one record. Returns whether it existed.
    pub fn remove(&self, canonical_name: &str) -> CacheResult<bool> {
        let changed = self.conn.lock().execute(
            "DELETE FROM schema_cache WHERE canonical = ?1",
            params![canonical_name],
        )?;
        Ok(changed > 0)
    }

    pub fn clear(&self) -> CacheResult<()> {
        self.conn.lock().execute("DELETE FROM schema_cache", [])?;
        Ok(())
    }

    pub fn count(&self) -> CacheResult<usize> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM schema_cache", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

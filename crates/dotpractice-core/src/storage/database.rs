//! SQLite-backed key-value storage.
//!
//! The practice store is a single JSON document kept under
//! [`STORE_KEY`](super::STORE_KEY) in the `kv` table.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection};

use super::{data_dir, STORE_KEY};
use crate::error::StorageError;

/// Where the ledger reads and writes the store document.
///
/// `save` receives a fully serialized document, so a backend either
/// stores all of it or none of it.
pub trait StoreBackend: Send {
    fn load(&self) -> Result<Option<String>, StorageError>;
    fn save(&mut self, document: &str) -> Result<(), StorageError>;
}

/// SQLite database holding the store document.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data dir>/dotpractice.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let path = data_dir()?.join("dotpractice.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    ///
    /// # Errors
    /// Returns an error if SQLite cannot allocate the database.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl StoreBackend for Database {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.kv_get(STORE_KEY)?)
    }

    fn save(&mut self, document: &str) -> Result<(), StorageError> {
        Ok(self.kv_set(STORE_KEY, document)?)
    }
}

/// Backend kept in memory. Clones share the same document.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    document: Arc<Mutex<Option<String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: Arc::new(Mutex::new(Some(document.into()))),
        }
    }

    /// Last saved document.
    pub fn document(&self) -> Option<String> {
        self.document
            .lock()
            .map(|doc| doc.clone())
            .unwrap_or_default()
    }
}

impl StoreBackend for MemoryBackend {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.document())
    }

    fn save(&mut self, document: &str) -> Result<(), StorageError> {
        let mut guard = self
            .document
            .lock()
            .map_err(|_| StorageError::QueryFailed("memory backend poisoned".into()))?;
        *guard = Some(document.to_string());
        Ok(())
    }
}

//! Document storage for processed message records.
//!
//! Records are JSON objects grouped into named collections. Inserts are the
//! only write path: the store assigns an ID and a `created_at` timestamp and
//! the document is never touched again by this service.

use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::distributions::Alphanumeric;
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum StorageError {
    Sqlite(rusqlite::Error),
    Io(std::io::Error),
    Serde(serde_json::Error),
    NotAnObject,
    Poisoned,
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Sqlite(e) => write!(f, "sqlite error: {e}"),
            StorageError::Io(e) => write!(f, "io error: {e}"),
            StorageError::Serde(e) => write!(f, "serialization error: {e}"),
            StorageError::NotAnObject => write!(f, "document must be a JSON object"),
            StorageError::Poisoned => write!(f, "store connection lock poisoned"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Sqlite(e)
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serde(e)
    }
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Store-assigned identity of a written document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertedDocument {
    pub id: String,
    pub created_at: u64,
}

/// A stored document with its assigned fields merged in.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub created_at: u64,
    pub body: Value,
}

pub trait DocumentStore: Send + Sync {
    /// Insert `doc` into `collection`. The stored body gets a `created_at`
    /// field set by the store, overriding any caller-provided value.
    fn insert(&self, collection: &str, doc: &Value) -> Result<InsertedDocument, StorageError>;

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StorageError>;

    /// All documents in a collection, oldest first.
    fn list(&self, collection: &str) -> Result<Vec<Document>, StorageError>;
}

const DOCUMENT_ID_LEN: usize = 20;

/// Random alphanumeric document ID.
pub fn new_document_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(DOCUMENT_ID_LEN)
        .map(char::from)
        .collect()
}

/// Current time as milliseconds since UNIX epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

// ---------------------------------------------------------------------------
// SQLite implementation
// ---------------------------------------------------------------------------

/// SQLite-backed document store. One table holds every collection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path. Creates schema if needed.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS documents (
                collection  TEXT NOT NULL,
                id          TEXT NOT NULL,
                created_at  INTEGER NOT NULL,
                body        TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );

            CREATE INDEX IF NOT EXISTS idx_documents_created
                ON documents(collection, created_at);
            ",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, i64, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn row_to_document(id: String, created_at: i64, body: String) -> Result<Document, StorageError> {
    Ok(Document {
        id,
        created_at: created_at as u64,
        body: serde_json::from_str(&body)?,
    })
}

impl DocumentStore for SqliteStore {
    fn insert(&self, collection: &str, doc: &Value) -> Result<InsertedDocument, StorageError> {
        let mut body = doc.as_object().cloned().ok_or(StorageError::NotAnObject)?;
        let id = new_document_id();
        let created_at = now_millis();
        body.insert("created_at".to_string(), Value::from(created_at));
        let text = serde_json::to_string(&body)?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO documents (collection, id, created_at, body)
             VALUES (?1, ?2, ?3, ?4)",
            params![collection, id, created_at as i64, text],
        )?;
        Ok(InsertedDocument { id, created_at })
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StorageError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, created_at, body FROM documents
                 WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                read_row,
            )
            .optional()?;
        row.map(|(id, created_at, body)| row_to_document(id, created_at, body))
            .transpose()
    }

    fn list(&self, collection: &str) -> Result<Vec<Document>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, created_at, body FROM documents
             WHERE collection = ?1 ORDER BY created_at, rowid",
        )?;
        let rows = stmt.query_map(params![collection], read_row)?;
        let mut docs = Vec::new();
        for row in rows {
            let (id, created_at, body) = row?;
            docs.push(row_to_document(id, created_at, body)?);
        }
        Ok(docs)
    }
}

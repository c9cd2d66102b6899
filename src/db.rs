//! Database module
//!
//! Durable key-value storage for the conversation collection. The whole
//! collection is stored as one JSON blob under a fixed key; every save
//! replaces it.

mod schema;

pub use schema::*;

use crate::state_machine::{Conversation, ConversationId};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid stored value for {key}: {value}")]
    InvalidValue { key: String, value: String },
    #[error("Database lock poisoned")]
    LockPoisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open the database at `path`, setting an unreadable file aside.
    ///
    /// A file that is not a usable database is renamed to `<path>.corrupt`
    /// and a fresh one is created in its place. If even that fails the
    /// session runs on an in-memory database and nothing is kept on disk.
    pub fn open_or_recover(path: &Path) -> DbResult<Self> {
        let err = match Self::open(path) {
            Ok(db) => return Ok(db),
            Err(e) => e,
        };

        let mut backup = path.as_os_str().to_owned();
        backup.push(".corrupt");
        let backup = PathBuf::from(backup);
        tracing::warn!(
            path = %path.display(),
            backup = %backup.display(),
            error = %err,
            "Database unreadable, starting with empty storage"
        );

        let reopened = std::fs::rename(path, &backup)
            .map_err(|e| e.to_string())
            .and_then(|()| Self::open(path).map_err(|e| e.to_string()));
        match reopened {
            Ok(db) => Ok(db),
            Err(e) => {
                tracing::warn!(error = %e, "Falling back to in-memory storage");
                Self::open_in_memory()
            }
        }
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Raw key-value access ====================

    pub fn get_value(&self, key: &str) -> DbResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn put_value(&self, key: &str, value: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    // ==================== Conversation collection ====================

    /// Load the stored collection. Absent means empty; an unparseable blob
    /// is an error the caller may choose to treat as empty.
    pub fn load_conversations(&self) -> DbResult<Vec<Conversation>> {
        match self.get_value(CONVERSATIONS_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Load the id high-water mark, if one was saved
    pub fn load_id_watermark(&self) -> DbResult<Option<ConversationId>> {
        self.get_value(ID_WATERMARK_KEY)?
            .map(|value| {
                value.parse().map_err(|_| DbError::InvalidValue {
                    key: ID_WATERMARK_KEY.to_string(),
                    value,
                })
            })
            .transpose()
    }

    /// Replace the stored collection and watermark in one transaction
    pub fn save_conversations(
        &self,
        conversations: &[Conversation],
        id_watermark: ConversationId,
    ) -> DbResult<()> {
        let json = serde_json::to_string(conversations)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for (key, value) in [
            (CONVERSATIONS_KEY, json),
            (ID_WATERMARK_KEY, id_watermark.to_string()),
        ] {
            tx.execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

//! Database connection management

use crate::error::Result;
use rusqlite::{params, Connection};
use std::path::Path;

/// Database wrapper for the local mirror file
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the mirror at the given path, creating the file and its parent
    /// directory if they don't exist
    ///
    /// Tables are created lazily by the stores that use them.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let database = Self {
            conn: Connection::open(path)?,
        };
        database.configure()?;
        tracing::debug!("Opened mirror database at {}", path.display());
        Ok(database)
    }

    /// Open an in-memory database (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        let database = Self {
            conn: Connection::open_in_memory()?,
        };
        database.configure()?;
        Ok(database)
    }

    /// Configure `SQLite` for a single-writer polling process
    fn configure(&self) -> Result<()> {
        // In-memory databases report "memory" instead of switching to WAL
        self.conn
            .query_row("PRAGMA journal_mode = WAL;", [], |_| Ok(()))
            .ok();
        self.conn.execute_batch(
            "PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA cache_size = 10000;",
        )?;
        Ok(())
    }

    /// Whether `table` has been created yet
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let exists: i32 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            params![table],
            |row| row.get(0),
        )?;
        Ok(exists != 0)
    }

    /// Get a reference to the underlying connection
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}

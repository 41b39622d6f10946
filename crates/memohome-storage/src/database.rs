// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;
use std::time::Duration;

use memohome_core::MemohomeError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations::run_migrations;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the memohome SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` in WAL mode and apply migrations.
    pub async fn open(path: &str) -> Result<Self, MemohomeError> {
        Self::open_with(path, true).await
    }

    /// Open the database at `path`, choosing the journal mode.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, MemohomeError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(MemohomeError::storage)?;
        }

        let conn = Connection::open(path)
            .await
            .map_err(MemohomeError::storage)?;
        let db = Self { conn };
        db.initialize(wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// Open a private in-memory database with the schema applied. Used by tests and dry runs.
    pub async fn open_in_memory() -> Result<Self, MemohomeError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(MemohomeError::storage)?;
        let db = Self { conn };
        db.initialize(false).await?;
        Ok(db)
    }

    async fn initialize(&self, wal_mode: bool) -> Result<(), MemohomeError> {
        self.conn
            .call(move |conn| -> Result<(), MemohomeError> {
                if wal_mode {
                    let mode: String = conn
                        .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                        .map_err(MemohomeError::storage)?;
                    debug!(journal_mode = %mode, "journal mode set");
                }
                conn.busy_timeout(BUSY_TIMEOUT)
                    .map_err(MemohomeError::storage)?;
                conn.execute_batch("PRAGMA synchronous = NORMAL; PRAGMA foreign_keys = ON;")
                    .map_err(MemohomeError::storage)?;
                run_migrations(conn)
            })
            .await
            .map_err(map_tr_err)
    }

    /// The single background connection every query goes through.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), MemohomeError> {
        self.checkpoint().await?;
        self.conn.close().await.map_err(MemohomeError::storage)?;
        debug!("database closed");
        Ok(())
    }

    /// Flush the WAL into the main database file.
    pub async fn checkpoint(&self) -> Result<(), MemohomeError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("PRAGMA wal_checkpoint(TRUNCATE);", [], |_| Ok(()))?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Convert a tokio-rusqlite error into a storage error.
pub(crate) fn map_tr_err<E>(e: tokio_rusqlite::Error<E>) -> MemohomeError
where
    tokio_rusqlite::Error<E>: std::error::Error + Send + Sync + 'static,
{
    MemohomeError::storage(e)
}

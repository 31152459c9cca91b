// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection lifecycle for the processed-state database.
//!
//! One tokio-rusqlite connection serves the whole process. Its background
//! thread executes statements strictly in submission order, which is what
//! makes the store single-writer without any locking of its own; opening
//! a second connection for writes would forfeit that guarantee. The SQL
//! schema ships embedded in the binary and is brought up to date every
//! time a database file is opened.

use std::path::Path;

use tokio_rusqlite::Connection;
use tracing::debug;

use vidsift_core::VidsiftError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Bring the schema up to the version compiled into this binary.
///
/// Refinery records what it has already applied inside the database, so
/// opening an up-to-date file is a no-op.
fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), tokio_rusqlite::Error> {
    embedded::migrations::runner()
        .run(conn)
        .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
    Ok(())
}

/// Handle to the processed-state SQLite database.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path`, apply pragmas,
    /// and run pending schema migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, VidsiftError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| VidsiftError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = Connection::open(path).await.map_err(map_tr_err)?;

        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA foreign_keys = ON;",
            )?;
            run_migrations(conn)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path = %path.display(), "database opened");
        Ok(Self { conn })
    }

    /// The underlying serialized connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL so all state reaches the main database file.
    pub async fn close(&self) -> Result<(), VidsiftError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Map a tokio-rusqlite error into the workspace storage error.
pub fn map_tr_err(err: tokio_rusqlite::Error) -> VidsiftError {
    VidsiftError::Storage {
        source: Box::new(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_file_and_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("state/processed.db");
        let db = Database::open(&db_path).await.unwrap();
        assert!(db_path.exists(), "database file should be created");

        // Both tables exist after migrations.
        let tables: Vec<String> = db
            .connection()
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                let mut names = Vec::new();
                for row in rows {
                    names.push(row?);
                }
                Ok(names)
            })
            .await
            .unwrap();
        assert!(tables.iter().any(|t| t == "processed_messages"));
        assert!(tables.iter().any(|t| t == "processed_videos"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reopen.db");
        let db = Database::open(&db_path).await.unwrap();
        db.close().await.unwrap();
        drop(db);
        // Migrations must not fail on an already-migrated database.
        let db = Database::open(&db_path).await.unwrap();
        db.close().await.unwrap();
    }
}

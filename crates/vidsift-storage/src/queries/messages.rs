// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Processed-message progress queries.

use rusqlite::params;

use vidsift_core::VidsiftError;

use crate::database::{map_tr_err, Database};

/// True if the scanner has ever committed this message key.
pub async fn has_message(db: &Database, key: &str) -> Result<bool, VidsiftError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM processed_messages WHERE message_key = ?1)",
                params![key],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
        .await
        .map_err(map_tr_err)
}

/// Record a message key as handled. Idempotent: re-inserting an existing
/// key is a no-op, never an error.
pub async fn put_message(db: &Database, key: &str) -> Result<(), VidsiftError> {
    let key = key.to_string();
    let now = chrono::Utc::now().to_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO processed_messages (message_key, processed_at)
                 VALUES (?1, ?2)",
                params![key, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Number of processed-message rows.
pub async fn message_count(db: &Database) -> Result<u64, VidsiftError> {
    db.connection()
        .call(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM processed_messages", [], |row| {
                    row.get(0)
                })?;
            Ok(count as u64)
        })
        .await
        .map_err(map_tr_err)
}

// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot migration of legacy plaintext state files into the database.
//!
//! Earlier releases tracked progress in three sidecar files next to the
//! database: a line-per-key processed-messages list, a line-per-filename
//! processed-videos list, and a JSON metadata map. On first open their
//! contents are ingested (videos under the wildcard topic, since the
//! legacy format never recorded one) and each file is renamed with a
//! `.backup` suffix so the import never repeats.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::params;
use serde::Deserialize;
use tracing::{info, warn};

use vidsift_core::VidsiftError;

use crate::database::{map_tr_err, Database};
use crate::models::WILDCARD_TOPIC;

/// Counts of rows ingested from the legacy files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegacyImport {
    pub messages: usize,
    pub videos: usize,
}

/// Video metadata as recorded by the legacy JSON map, keyed by filename.
#[derive(Debug, Clone, Default, Deserialize)]
struct LegacyVideoMetadata {
    #[serde(default, alias = "duration")]
    duration_secs: Option<u32>,
    #[serde(default, alias = "sizeMB")]
    size_mb: Option<f64>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default, alias = "mimeType")]
    mime_type: Option<String>,
}

/// Ingest any legacy plaintext files found next to the database.
///
/// Each table's import runs in one transaction; a file is renamed to
/// `<name>.backup` only after its transaction commits, so a crash mid-way
/// re-runs the (idempotent) import on the next open.
pub async fn import_if_present(
    db: &Database,
    messages_path: &Path,
    videos_path: &Path,
    metadata_path: &Path,
    normalize: &dyn Fn(&str) -> String,
) -> Result<LegacyImport, VidsiftError> {
    let mut imported = LegacyImport::default();

    if messages_path.exists() {
        let keys = read_lines(messages_path)?;
        imported.messages = import_messages(db, keys).await?;
        rename_to_backup(messages_path)?;
        info!(
            count = imported.messages,
            file = %messages_path.display(),
            "imported legacy processed-message keys"
        );
    }

    if videos_path.exists() {
        let metadata = if metadata_path.exists() {
            read_metadata(metadata_path)?
        } else {
            HashMap::new()
        };
        let names = read_lines(videos_path)?;
        imported.videos = import_videos(db, names, &metadata, normalize).await?;
        rename_to_backup(videos_path)?;
        if metadata_path.exists() {
            rename_to_backup(metadata_path)?;
        }
        info!(
            count = imported.videos,
            file = %videos_path.display(),
            "imported legacy processed-video names"
        );
    }

    Ok(imported)
}

fn read_lines(path: &Path) -> Result<Vec<String>, VidsiftError> {
    let content = std::fs::read_to_string(path).map_err(|e| VidsiftError::Io {
        message: format!("failed to read legacy file {}", path.display()),
        source: e,
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

fn read_metadata(path: &Path) -> Result<HashMap<String, LegacyVideoMetadata>, VidsiftError> {
    let content = std::fs::read_to_string(path).map_err(|e| VidsiftError::Io {
        message: format!("failed to read legacy metadata {}", path.display()),
        source: e,
    })?;
    match serde_json::from_str(&content) {
        Ok(map) => Ok(map),
        Err(e) => {
            // A corrupt metadata file must not block the import; the video
            // names alone are still worth keeping.
            warn!(error = %e, file = %path.display(), "ignoring unparseable legacy metadata");
            Ok(HashMap::new())
        }
    }
}

async fn import_messages(db: &Database, keys: Vec<String>) -> Result<usize, VidsiftError> {
    let now = chrono::Utc::now().to_rfc3339();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut inserted = 0;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR IGNORE INTO processed_messages (message_key, processed_at)
                     VALUES (?1, ?2)",
                )?;
                for key in &keys {
                    inserted += stmt.execute(params![key, now])?;
                }
            }
            tx.commit()?;
            Ok(inserted)
        })
        .await
        .map_err(map_tr_err)
}

async fn import_videos(
    db: &Database,
    names: Vec<String>,
    metadata: &HashMap<String, LegacyVideoMetadata>,
    normalize: &dyn Fn(&str) -> String,
) -> Result<usize, VidsiftError> {
    let now = chrono::Utc::now().to_rfc3339();
    let rows: Vec<_> = names
        .into_iter()
        .map(|file_name| {
            let meta = metadata.get(&file_name).cloned().unwrap_or_default();
            (file_name.clone(), normalize(&file_name), meta)
        })
        .collect();

    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut inserted = 0;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO processed_videos
                       (file_name, normalized_name, topic_name, duration_secs, size_mb,
                        width, height, mime_type, processed_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                     ON CONFLICT (normalized_name, topic_name) DO NOTHING",
                )?;
                for (file_name, normalized, meta) in &rows {
                    inserted += stmt.execute(params![
                        file_name,
                        normalized,
                        WILDCARD_TOPIC,
                        meta.duration_secs,
                        meta.size_mb,
                        meta.width,
                        meta.height,
                        meta.mime_type,
                        now,
                    ])?;
                }
            }
            tx.commit()?;
            Ok(inserted)
        })
        .await
        .map_err(map_tr_err)
}

fn rename_to_backup(path: &Path) -> Result<(), VidsiftError> {
    let backup = std::path::PathBuf::from(format!("{}.backup", path.display()));
    std::fs::rename(path, &backup).map_err(|e| VidsiftError::Io {
        message: format!("failed to rename legacy file {}", path.display()),
        source: e,
    })
}

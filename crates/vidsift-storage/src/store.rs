// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `Store` facade over the processed-state database.
//!
//! Wraps a [`Database`] handle and delegates to the typed query modules.
//! The store exclusively owns its durable files; there is one store per
//! process and all writes serialize through its single connection.

use tracing::debug;

use vidsift_config::StorageConfig;
use vidsift_core::VidsiftError;

use crate::database::Database;
use crate::legacy::{self, LegacyImport};
use crate::models::{NewProcessedVideo, ProcessedVideo};
use crate::queries;

/// Durable set of processed message keys and processed
/// `(normalized_name, topic)` video records.
pub struct Store {
    db: Database,
}

impl Store {
    /// Open the store at the configured location, creating the database
    /// and running schema migrations as needed.
    pub async fn open(config: &StorageConfig) -> Result<Self, VidsiftError> {
        let db = Database::open(config.database_path()).await?;
        debug!(path = %config.database_path().display(), "store opened");
        Ok(Self { db })
    }

    /// Ingest legacy plaintext state files if they are still present.
    ///
    /// `normalize` derives the dedup key for legacy video filenames; pass
    /// the same normalizer the ingestion run uses.
    pub async fn import_legacy(
        &self,
        config: &StorageConfig,
        normalize: &dyn Fn(&str) -> String,
    ) -> Result<LegacyImport, VidsiftError> {
        let (messages, videos, metadata) = config.legacy_paths();
        legacy::import_if_present(&self.db, &messages, &videos, &metadata, normalize).await
    }

    /// True if the scanner has ever committed this message key.
    pub async fn has_message(&self, key: &str) -> Result<bool, VidsiftError> {
        queries::messages::has_message(&self.db, key).await
    }

    /// Record a message key as handled (idempotent).
    pub async fn put_message(&self, key: &str) -> Result<(), VidsiftError> {
        queries::messages::put_message(&self.db, key).await
    }

    /// Register a processed video (idempotent per `(name, topic)`).
    pub async fn put_video(&self, video: &NewProcessedVideo) -> Result<(), VidsiftError> {
        queries::videos::put_video(&self.db, video).await
    }

    /// All rows visible from `topic` (topic rows plus legacy wildcard
    /// rows), in insertion order.
    pub async fn videos_in_topic(&self, topic: &str) -> Result<Vec<ProcessedVideo>, VidsiftError> {
        queries::videos::videos_in_topic(&self.db, topic).await
    }

    /// Delete rows for these normalized names under `topic` (and the
    /// legacy wildcard). Returns the number deleted.
    pub async fn delete_videos(
        &self,
        names: &[String],
        topic: &str,
    ) -> Result<usize, VidsiftError> {
        queries::videos::delete_videos(&self.db, names, topic).await
    }

    /// Number of processed-message rows.
    pub async fn message_count(&self) -> Result<u64, VidsiftError> {
        queries::messages::message_count(&self.db).await
    }

    /// Number of processed-video rows.
    pub async fn video_count(&self) -> Result<u64, VidsiftError> {
        queries::videos::video_count(&self.db).await
    }

    /// Per-topic video row counts for reporting.
    pub async fn video_counts_by_topic(&self) -> Result<Vec<(String, u64)>, VidsiftError> {
        queries::videos::video_counts_by_topic(&self.db).await
    }

    /// Checkpoint and release the database.
    pub async fn close(&self) -> Result<(), VidsiftError> {
        self.db.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn storage_config(dir: &std::path::Path) -> StorageConfig {
        StorageConfig {
            data_dir: dir.to_string_lossy().to_string(),
        }
    }

    #[tokio::test]
    async fn open_put_and_read_back() {
        let dir = tempdir().unwrap();
        let store = Store::open(&storage_config(dir.path())).await.unwrap();

        store.put_message("-100:7").await.unwrap();
        assert!(store.has_message("-100:7").await.unwrap());

        store
            .put_video(&NewProcessedVideo {
                file_name: "A.Keyword.mp4".to_string(),
                normalized_name: "akeyword".to_string(),
                topic_name: "keyword".to_string(),
                ..NewProcessedVideo::default()
            })
            .await
            .unwrap();
        let rows = store.videos_in_topic("keyword").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].normalized_name, "akeyword");

        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn import_legacy_runs_through_facade() {
        let dir = tempdir().unwrap();
        let config = storage_config(dir.path());
        std::fs::write(dir.path().join("processed-messages.txt"), "-1:1\n-1:2\n").unwrap();

        let store = Store::open(&config).await.unwrap();
        let imported = store
            .import_legacy(&config, &|n| n.to_lowercase())
            .await
            .unwrap();
        assert_eq!(imported.messages, 2);
        assert_eq!(store.message_count().await.unwrap(), 2);
    }
}

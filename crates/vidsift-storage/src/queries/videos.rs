// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Processed-video queries.

use rusqlite::{params, params_from_iter};

use vidsift_core::VidsiftError;

use crate::database::{map_tr_err, Database};
use crate::models::{NewProcessedVideo, ProcessedVideo, WILDCARD_TOPIC};

fn row_to_video(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProcessedVideo> {
    Ok(ProcessedVideo {
        id: row.get(0)?,
        file_name: row.get(1)?,
        normalized_name: row.get(2)?,
        topic_name: row.get(3)?,
        duration_secs: row.get(4)?,
        size_mb: row.get(5)?,
        width: row.get(6)?,
        height: row.get(7)?,
        mime_type: row.get(8)?,
        processed_at: row.get(9)?,
    })
}

const VIDEO_COLUMNS: &str = "id, file_name, normalized_name, topic_name, duration_secs, \
                             size_mb, width, height, mime_type, processed_at";

/// Register a processed video. Idempotent on `(normalized_name,
/// topic_name)`: a second insert for the same pair leaves the existing row
/// untouched.
pub async fn put_video(db: &Database, video: &NewProcessedVideo) -> Result<(), VidsiftError> {
    let video = video.clone();
    let now = chrono::Utc::now().to_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO processed_videos
                   (file_name, normalized_name, topic_name, duration_secs, size_mb,
                    width, height, mime_type, processed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT (normalized_name, topic_name) DO NOTHING",
                params![
                    video.file_name,
                    video.normalized_name,
                    video.topic_name,
                    video.duration_secs,
                    video.size_mb,
                    video.width,
                    video.height,
                    video.mime_type,
                    now,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// All rows registered under `topic` (including legacy wildcard rows), in
/// insertion order.
pub async fn videos_in_topic(
    db: &Database,
    topic: &str,
) -> Result<Vec<ProcessedVideo>, VidsiftError> {
    let topic = topic.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {VIDEO_COLUMNS} FROM processed_videos
                 WHERE topic_name = ?1 OR topic_name = ?2
                 ORDER BY id ASC"
            );
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt.query_map(params![topic, WILDCARD_TOPIC], row_to_video)?;
            let mut videos = Vec::new();
            for row in rows {
                videos.push(row?);
            }
            Ok(videos)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete rows whose normalized name is in `names` and whose topic is
/// `topic` or the legacy wildcard. Returns the number of rows removed.
pub async fn delete_videos(
    db: &Database,
    names: &[String],
    topic: &str,
) -> Result<usize, VidsiftError> {
    if names.is_empty() {
        return Ok(0);
    }
    let names: Vec<String> = names.to_vec();
    let topic = topic.to_string();
    db.connection()
        .call(move |conn| {
            let placeholders = vec!["?"; names.len()].join(", ");
            let sql = format!(
                "DELETE FROM processed_videos
                 WHERE normalized_name IN ({placeholders})
                   AND topic_name IN (?, ?)"
            );
            let mut stmt = conn.prepare(&sql)?;
            let args = names
                .iter()
                .map(|n| n.as_str())
                .chain([topic.as_str(), WILDCARD_TOPIC]);
            let deleted = stmt.execute(params_from_iter(args))?;
            Ok(deleted)
        })
        .await
        .map_err(map_tr_err)
}

/// Number of processed-video rows.
pub async fn video_count(db: &Database) -> Result<u64, VidsiftError> {
    db.connection()
        .call(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM processed_videos", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
        .map_err(map_tr_err)
}

/// Row counts per topic, alphabetically, for reporting.
pub async fn video_counts_by_topic(db: &Database) -> Result<Vec<(String, u64)>, VidsiftError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT topic_name, COUNT(*) FROM processed_videos
                 GROUP BY topic_name ORDER BY topic_name",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?;
            let mut counts = Vec::new();
            for row in rows {
                counts.push(row?);
            }
            Ok(counts)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn open_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db")).await.unwrap();
        (db, dir)
    }

    fn video(normalized: &str, topic: &str) -> NewProcessedVideo {
        NewProcessedVideo {
            file_name: format!("{normalized}.mp4"),
            normalized_name: normalized.to_string(),
            topic_name: topic.to_string(),
            duration_secs: Some(600),
            size_mb: Some(120.0),
            ..NewProcessedVideo::default()
        }
    }

    #[tokio::test]
    async fn put_video_is_idempotent_per_topic_pair() {
        let (db, _dir) = open_db().await;
        put_video(&db, &video("samplekeyword", "keyword")).await.unwrap();
        put_video(&db, &video("samplekeyword", "keyword")).await.unwrap();
        assert_eq!(video_count(&db).await.unwrap(), 1);

        // Same name under another topic is a distinct row.
        put_video(&db, &video("samplekeyword", "other")).await.unwrap();
        assert_eq!(video_count(&db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn videos_in_topic_includes_wildcard_rows_in_insertion_order() {
        let (db, _dir) = open_db().await;
        put_video(&db, &video("first", "keyword")).await.unwrap();
        put_video(&db, &video("legacy", WILDCARD_TOPIC)).await.unwrap();
        put_video(&db, &video("second", "keyword")).await.unwrap();
        put_video(&db, &video("elsewhere", "other")).await.unwrap();

        let rows = videos_in_topic(&db, "keyword").await.unwrap();
        let names: Vec<_> = rows.iter().map(|v| v.normalized_name.as_str()).collect();
        assert_eq!(names, vec!["first", "legacy", "second"]);
    }

    #[tokio::test]
    async fn delete_videos_hits_topic_and_wildcard_only() {
        let (db, _dir) = open_db().await;
        put_video(&db, &video("dup", "keyword")).await.unwrap();
        put_video(&db, &video("dup", WILDCARD_TOPIC)).await.unwrap();
        put_video(&db, &video("dup", "other")).await.unwrap();
        put_video(&db, &video("keep", "keyword")).await.unwrap();

        let deleted = delete_videos(&db, &["dup".to_string()], "keyword")
            .await
            .unwrap();
        assert_eq!(deleted, 2);

        let remaining = videos_in_topic(&db, "other").await.unwrap();
        assert_eq!(remaining.len(), 1);
        let kept = videos_in_topic(&db, "keyword").await.unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].normalized_name, "keep");
    }

    #[tokio::test]
    async fn delete_videos_with_empty_set_is_noop() {
        let (db, _dir) = open_db().await;
        put_video(&db, &video("x", "keyword")).await.unwrap();
        assert_eq!(delete_videos(&db, &[], "keyword").await.unwrap(), 0);
        assert_eq!(video_count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn counts_by_topic_groups_rows() {
        let (db, _dir) = open_db().await;
        put_video(&db, &video("a", "keyword")).await.unwrap();
        put_video(&db, &video("b", "keyword")).await.unwrap();
        put_video(&db, &video("c", "other")).await.unwrap();

        let counts = video_counts_by_topic(&db).await.unwrap();
        assert_eq!(
            counts,
            vec![("keyword".to_string(), 2), ("other".to_string(), 1)]
        );
    }
}

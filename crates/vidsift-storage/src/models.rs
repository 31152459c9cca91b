// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for the rows stored in the SQLite database.

use serde::{Deserialize, Serialize};

/// Sentinel topic meaning "processed under an unknown topic"; written only
/// by the legacy plaintext import, never by new ingestion.
pub const WILDCARD_TOPIC: &str = "*";

/// A processed-video row.
///
/// At most one row exists per `(normalized_name, topic_name)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedVideo {
    /// Row id; rows scan in insertion order.
    pub id: i64,
    /// Original filename at the time of processing.
    pub file_name: String,
    /// Canonical dedup key.
    pub normalized_name: String,
    /// Destination topic the video was registered under.
    pub topic_name: String,
    pub duration_secs: Option<u32>,
    pub size_mb: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub mime_type: Option<String>,
    /// ISO 8601 registration timestamp.
    pub processed_at: String,
}

/// Fields of a processed-video row to insert.
#[derive(Debug, Clone, Default)]
pub struct NewProcessedVideo {
    pub file_name: String,
    pub normalized_name: String,
    pub topic_name: String,
    pub duration_secs: Option<u32>,
    pub size_mb: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub mime_type: Option<String>,
}

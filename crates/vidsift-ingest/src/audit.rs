// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only audit log of successful forwards.
//!
//! The log is a JSON array in a single file, maintained read-modify-write.
//! That is acceptable here: the tool is the file's only writer and entries
//! are appended in the order forwards succeed, serialized by the internal
//! lock.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use vidsift_core::VidsiftError;

/// One successful forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardAuditEntry {
    /// ISO 8601 time of the forward.
    pub timestamp: String,
    pub file_name: String,
    pub matched_keyword: String,
    pub topic_name: String,
    /// Source chat the message came from.
    pub source_group: i64,
    pub duration_secs: Option<u32>,
    pub size_mb: f64,
}

/// Handle to the forwarding log file.
pub struct AuditLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Append one entry, creating the file on first use.
    pub async fn append(&self, entry: ForwardAuditEntry) -> Result<(), VidsiftError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries()?;
        entries.push(entry);
        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| VidsiftError::Internal(format!("audit serialization failed: {e}")))?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| VidsiftError::Io {
                message: format!("failed to create {}", parent.display()),
                source: e,
            })?;
        }
        std::fs::write(&self.path, json).map_err(|e| VidsiftError::Io {
            message: format!("failed to write audit log {}", self.path.display()),
            source: e,
        })
    }

    /// All recorded entries, oldest first.
    pub async fn entries(&self) -> Result<Vec<ForwardAuditEntry>, VidsiftError> {
        let _guard = self.lock.lock().await;
        self.read_entries()
    }

    fn read_entries(&self) -> Result<Vec<ForwardAuditEntry>, VidsiftError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| VidsiftError::Io {
            message: format!("failed to read audit log {}", self.path.display()),
            source: e,
        })?;
        serde_json::from_str(&content)
            .map_err(|e| VidsiftError::Internal(format!("audit log is not a JSON array: {e}")))
    }
}

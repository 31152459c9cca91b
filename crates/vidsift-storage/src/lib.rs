// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable processed-state storage for vidsift.
//!
//! A single SQLite database (WAL mode, serialized through tokio-rusqlite's
//! background thread) holds the processed-message progress set and the
//! per-topic processed-video records. Legacy plaintext state files are
//! migrated once on first open.

pub mod database;
pub mod legacy;
pub mod models;
pub mod queries;
pub mod store;

pub use database::Database;
pub use legacy::LegacyImport;
pub use models::{NewProcessedVideo, ProcessedVideo, WILDCARD_TOPIC};
pub use store::Store;

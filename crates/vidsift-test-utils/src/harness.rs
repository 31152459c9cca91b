// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end ingestion runs.
//!
//! `TestHarness` assembles a complete stack -- temp-directory store, fake
//! chat transport, and configuration -- and runs the full ingestion
//! pipeline against it.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use vidsift_config::{DedupConfig, VidsiftConfig};
use vidsift_core::VidsiftError;
use vidsift_ingest::{AuditLog, ForwardAuditEntry, IngestionRunner, RunSummary};
use vidsift_storage::Store;

use crate::fake_client::FakeChatClient;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: VidsiftConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = VidsiftConfig::default();
        config.filter.video_matches = vec!["keyword".to_string()];
        Self { config }
    }

    /// Replace the match keyword list (default: `["keyword"]`).
    pub fn with_matches(mut self, matches: &[&str]) -> Self {
        self.config.filter.video_matches = matches.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn with_exclusions(mut self, exclusions: &[&str]) -> Self {
        self.config.filter.video_exclusions =
            exclusions.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn with_min_duration(mut self, secs: u32) -> Self {
        self.config.filter.min_video_duration_secs = secs;
        self
    }

    pub fn with_max_forwards(mut self, cap: u64) -> Self {
        self.config.run.max_forwards = cap;
        self
    }

    pub fn with_sources(mut self, sources: &[i64]) -> Self {
        self.config.run.source_groups = sources.to_vec();
        self
    }

    pub fn with_dry_run(mut self) -> Self {
        self.config.run.dry_run = true;
        self
    }

    pub fn with_skip_cleanup(mut self) -> Self {
        self.config.run.skip_cleanup = true;
        self
    }

    pub fn with_dedup(mut self, dedup: DedupConfig) -> Self {
        self.config.dedup = dedup;
        self
    }

    /// Apply any other config adjustment.
    pub fn with_config(mut self, adjust: impl FnOnce(&mut VidsiftConfig)) -> Self {
        adjust(&mut self.config);
        self
    }

    /// Build the harness: temp data directory, open store, fake client.
    pub async fn build(mut self) -> Result<TestHarness, VidsiftError> {
        let temp_dir = tempfile::tempdir().map_err(|e| VidsiftError::Io {
            message: "failed to create temp dir".to_string(),
            source: e,
        })?;
        self.config.storage.data_dir = temp_dir.path().to_string_lossy().to_string();

        let store = Arc::new(Store::open(&self.config.storage).await?);
        let client = Arc::new(FakeChatClient::new());

        Ok(TestHarness {
            client,
            store,
            config: self.config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment: fake transport, temp store, config.
pub struct TestHarness {
    /// The fake chat transport; seed chats and messages here.
    pub client: Arc<FakeChatClient>,
    /// The open store, for assertions on processed state.
    pub store: Arc<Store>,
    /// Effective configuration for the run.
    pub config: VidsiftConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Run the full ingestion pipeline once.
    pub async fn run(&self) -> Result<RunSummary, VidsiftError> {
        let runner = IngestionRunner::new(
            self.client.clone(),
            self.store.clone(),
            self.config.clone(),
        );
        runner.run(CancellationToken::new()).await
    }

    /// Entries currently in the forwarding audit log.
    pub async fn audit_entries(&self) -> Result<Vec<ForwardAuditEntry>, VidsiftError> {
        AuditLog::new(self.config.storage.audit_log_path())
            .entries()
            .await
    }
}

// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One full ingestion run: provision, sweep, then scan each source.
//!
//! Sources are processed strictly one after another; parallelism exists
//! only inside a candidate's forward fan-out. Per-source errors are logged
//! with context and the run continues with the next source; configuration
//! errors abort before any RPC.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use vidsift_config::{format_errors, validate_config, VidsiftConfig};
use vidsift_core::{ChatClient, ChatId, ChatKind, VidsiftError};
use vidsift_storage::Store;

use crate::audit::AuditLog;
use crate::driver::RateLimitDriver;
use crate::forum;
use crate::forwarder::Forwarder;
use crate::normalize::normalized_name;
use crate::oracle::DuplicateOracle;
use crate::scanner::SourceScanner;
use crate::sweeper::{CleanupSweeper, SweepOutcome};

/// Ceiling on the accessible-chat listing when no sources are configured.
const MAX_ACCESSIBLE_CHATS: usize = 500;

/// End-of-run totals, also streamed to the log.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub sources_scanned: u64,
    pub messages_processed: u64,
    /// Distinct source messages with at least one successful forward.
    pub forwarded: u64,
    /// Successful forwards per topic.
    pub per_topic: BTreeMap<String, u64>,
    pub sweep: Option<SweepOutcome>,
}

/// Orchestrates one ingestion run over all configured sources.
pub struct IngestionRunner {
    client: Arc<dyn ChatClient>,
    store: Arc<Store>,
    config: VidsiftConfig,
}

impl IngestionRunner {
    pub fn new(client: Arc<dyn ChatClient>, store: Arc<Store>, config: VidsiftConfig) -> Self {
        Self {
            client,
            store,
            config,
        }
    }

    /// Run to completion or cancellation. The store stays open; the
    /// caller owns its lifecycle.
    pub async fn run(&self, cancel: CancellationToken) -> Result<RunSummary, VidsiftError> {
        validate_config(&self.config)
            .map_err(|errors| VidsiftError::Config(format_errors(&errors)))?;

        let driver = RateLimitDriver::new(cancel.clone());

        // Legacy state is folded in before anything consults the store.
        let normalize_flag = self.config.dedup.normalize_filenames;
        let imported = self
            .store
            .import_legacy(&self.config.storage, &move |name| {
                normalized_name(name, normalize_flag)
            })
            .await?;
        if imported.messages > 0 || imported.videos > 0 {
            info!(
                messages = imported.messages,
                videos = imported.videos,
                "legacy state imported"
            );
        }

        let (dest_chat, topics) =
            forum::ensure_destination(self.client.as_ref(), &driver, &self.config).await?;
        info!(
            dest = dest_chat.0,
            topics = topics.len(),
            dry_run = self.config.run.dry_run,
            "destination ready"
        );

        let sweep = if self.config.run.skip_cleanup {
            info!("cleanup sweep skipped by configuration");
            None
        } else {
            let sweeper = CleanupSweeper::new(
                self.client.as_ref(),
                &driver,
                &self.config.filter.video_exclusions,
                self.config.run.dry_run,
            );
            Some(sweeper.run(dest_chat).await?)
        };

        let sources = self.resolve_sources(&driver, dest_chat).await?;
        info!(count = sources.len(), "sources resolved");

        let oracle = DuplicateOracle::new(self.config.dedup.clone());
        let audit = AuditLog::new(self.config.storage.audit_log_path());
        let forwarder = Forwarder::new(self.client.clone(), driver.clone(), audit);

        let mut summary = RunSummary {
            sweep,
            ..RunSummary::default()
        };
        let mut forwarded_total = 0u64;

        for source in sources {
            if cancel.is_cancelled() {
                info!("run cancelled, stopping before next source");
                break;
            }
            if forwarded_total >= self.config.run.max_forwards {
                info!(cap = self.config.run.max_forwards, "forward cap reached");
                break;
            }

            let scanner = SourceScanner::new(
                self.client.as_ref(),
                self.store.as_ref(),
                &oracle,
                &driver,
                &forwarder,
                &self.config,
                dest_chat,
                &topics,
            );
            summary.sources_scanned += 1;
            match scanner.scan(source, forwarded_total).await {
                Ok(outcome) => {
                    summary.messages_processed += outcome.messages_processed;
                    forwarded_total = outcome.forwarded_total;
                    for (topic, count) in outcome.per_topic {
                        *summary.per_topic.entry(topic).or_default() += count;
                    }
                }
                Err(e) => {
                    error!(
                        source = source.0,
                        error = %e,
                        "source scan failed, continuing with next source"
                    );
                }
            }
        }
        summary.forwarded = forwarded_total;

        info!(
            sources = summary.sources_scanned,
            processed = summary.messages_processed,
            forwarded = summary.forwarded,
            "ingestion run complete"
        );
        for (topic, count) in &summary.per_topic {
            info!(topic = topic.as_str(), forwards = count, "topic total");
        }

        Ok(summary)
    }

    /// Configured sources, or every accessible group and channel except
    /// the destination.
    async fn resolve_sources(
        &self,
        driver: &RateLimitDriver,
        dest_chat: ChatId,
    ) -> Result<Vec<ChatId>, VidsiftError> {
        if !self.config.run.source_groups.is_empty() {
            return Ok(self
                .config
                .run
                .source_groups
                .iter()
                .map(|id| ChatId(*id))
                .collect());
        }
        let chats = driver
            .call("listAccessibleChats", || {
                self.client.list_chats(MAX_ACCESSIBLE_CHATS)
            })
            .await?;
        Ok(chats
            .into_iter()
            .filter(|c| matches!(c.kind, ChatKind::Group | ChatKind::Channel))
            .filter(|c| c.id != dest_chat)
            .map(|c| c.id)
            .collect())
    }
}

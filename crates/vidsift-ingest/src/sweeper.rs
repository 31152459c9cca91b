// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot cleanup pass over the destination chat.
//!
//! Runs after topic provisioning and before the main scan. Deletes
//! messages matching the exclusion list immediately, then removes
//! intra-topic duplicates (same lowercased filename under the same topic),
//! keeping the first message encountered. Running the sweep twice in a row
//! deletes nothing on the second pass.

use std::collections::HashMap;

use tracing::{debug, info};

use vidsift_core::{ChatClient, ChatId, VidsiftError, MAX_DELETE_BATCH, MAX_PAGE_SIZE};

use crate::driver::{
    RateLimitDriver, CLEANUP_BATCH_PAUSE, DELETE_BATCH_PAUSE, INTER_DELETE_PAUSE,
};
use crate::predicate;

/// Counters from one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Messages examined.
    pub scanned: u64,
    /// Messages deleted for matching an exclusion.
    pub excluded_deleted: u64,
    /// Messages deleted as intra-topic duplicates.
    pub duplicates_deleted: u64,
}

/// The cleanup sweeper.
pub struct CleanupSweeper<'a> {
    client: &'a dyn ChatClient,
    driver: &'a RateLimitDriver,
    exclusions: &'a [String],
    dry_run: bool,
}

impl<'a> CleanupSweeper<'a> {
    pub fn new(
        client: &'a dyn ChatClient,
        driver: &'a RateLimitDriver,
        exclusions: &'a [String],
        dry_run: bool,
    ) -> Self {
        Self {
            client,
            driver,
            exclusions,
            dry_run,
        }
    }

    /// Sweep the destination chat once.
    pub async fn run(&self, dest_chat: ChatId) -> Result<SweepOutcome, VidsiftError> {
        let mut outcome = SweepOutcome::default();
        // First message id seen per (topic, lowercased filename).
        let mut seen: HashMap<(i64, String), i64> = HashMap::new();
        let mut duplicate_queue: Vec<i64> = Vec::new();
        let mut offset_id = 0i64;

        info!(dest = dest_chat.0, "cleanup sweep started");

        loop {
            if self.driver.is_cancelled() {
                info!("cleanup sweep cancelled");
                break;
            }
            let page = self
                .driver
                .call("getHistoryPage", || {
                    self.client.history_page(dest_chat, offset_id, MAX_PAGE_SIZE)
                })
                .await?;
            if page.is_empty() {
                break;
            }

            for msg in &page {
                let Some(doc) = msg.media.document() else {
                    continue;
                };
                let Some(file_name) = doc.file_name.as_deref() else {
                    continue;
                };
                outcome.scanned += 1;

                let caption_lower = msg.caption.to_lowercase();
                if predicate::should_exclude(&caption_lower, file_name, self.exclusions) {
                    debug!(msg_id = msg.id, file_name, "deleting excluded message");
                    self.delete(dest_chat, &[msg.id]).await?;
                    outcome.excluded_deleted += 1;
                    self.driver.pause(INTER_DELETE_PAUSE).await;
                    continue;
                }

                // Messages outside any topic belong to the general topic.
                let topic = msg.reply_to_top_id.map(|t| t.0).unwrap_or(0);
                let key = (topic, file_name.to_lowercase());
                if seen.contains_key(&key) {
                    duplicate_queue.push(msg.id);
                } else {
                    seen.insert(key, msg.id);
                }
            }

            if let Some(last) = page.last() {
                offset_id = last.id;
            }
            self.driver.pause(CLEANUP_BATCH_PAUSE).await;
        }

        for chunk in duplicate_queue.chunks(MAX_DELETE_BATCH) {
            self.delete(dest_chat, chunk).await?;
            outcome.duplicates_deleted += chunk.len() as u64;
            self.driver.pause(DELETE_BATCH_PAUSE).await;
        }

        info!(
            scanned = outcome.scanned,
            excluded = outcome.excluded_deleted,
            duplicates = outcome.duplicates_deleted,
            "cleanup sweep finished"
        );
        Ok(outcome)
    }

    async fn delete(&self, chat: ChatId, ids: &[i64]) -> Result<(), VidsiftError> {
        if self.dry_run {
            info!(count = ids.len(), "dry-run: would delete messages");
            return Ok(());
        }
        self.driver
            .call("deleteMessages", || self.client.delete_messages(chat, ids))
            .await
    }
}

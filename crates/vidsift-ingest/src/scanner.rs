// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-source streaming scanner.
//!
//! Walks one source chat's history backward in pages, applies the video
//! predicate, and drives the dedup-then-forward loop per candidate. Two
//! invariants carry the whole design:
//!
//! - **Pre-commit**: the message-progress row is written the instant a
//!   message enters the decide stage. Once committed, the message is never
//!   reconsidered, even if everything after fails.
//! - **Pre-register**: the video row is written before the forward
//!   fan-out launches, so an identical candidate later in the same batch
//!   is caught by the oracle instead of forwarded twice.

use std::collections::{BTreeMap, HashSet};

use futures::future::join_all;
use tracing::{debug, info, warn};

use vidsift_config::{FilterConfig, VidsiftConfig};
use vidsift_core::{
    CandidateVideo, ChatClient, ChatId, TopicId, VidsiftError, MAX_DELETE_BATCH, MAX_PAGE_SIZE,
};
use vidsift_storage::{NewProcessedVideo, Store};

use crate::driver::{
    RateLimitDriver, DELETE_BATCH_PAUSE, INTER_DELETE_PAUSE, SCAN_BATCH_PAUSE,
};
use crate::forwarder::{ForwardRequest, Forwarder};
use crate::normalize::normalized_name;
use crate::oracle::DuplicateOracle;
use crate::predicate;
use crate::topic_cache::TopicCache;

/// Result of scanning one source.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Messages newly committed during this scan.
    pub messages_processed: u64,
    /// Global forward total after this source (input total plus this
    /// source's successes).
    pub forwarded_total: u64,
    /// Successful forwards per topic during this scan.
    pub per_topic: BTreeMap<String, u64>,
}

/// Scans one source chat per invocation.
pub struct SourceScanner<'a> {
    client: &'a dyn ChatClient,
    store: &'a Store,
    oracle: &'a DuplicateOracle,
    driver: &'a RateLimitDriver,
    forwarder: &'a Forwarder,
    config: &'a VidsiftConfig,
    dest_chat: ChatId,
    topics: &'a BTreeMap<String, TopicId>,
    topic_cache: TopicCache,
}

impl<'a> SourceScanner<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client: &'a dyn ChatClient,
        store: &'a Store,
        oracle: &'a DuplicateOracle,
        driver: &'a RateLimitDriver,
        forwarder: &'a Forwarder,
        config: &'a VidsiftConfig,
        dest_chat: ChatId,
        topics: &'a BTreeMap<String, TopicId>,
    ) -> Self {
        Self {
            client,
            store,
            oracle,
            driver,
            forwarder,
            config,
            dest_chat,
            topics,
            // The cache is confined to this source's processing context.
            topic_cache: TopicCache::new(),
        }
    }

    /// Walk `source`'s history until an empty page or the forward cap.
    ///
    /// `forwarded_before` is the global forward count accumulated by
    /// earlier sources; the cap applies across the whole run.
    pub async fn scan(
        mut self,
        source: ChatId,
        forwarded_before: u64,
    ) -> Result<ScanOutcome, VidsiftError> {
        let client = self.client;
        let driver = self.driver;

        let mut outcome = ScanOutcome {
            forwarded_total: forwarded_before,
            ..ScanOutcome::default()
        };
        let mut offset_id = 0i64;
        let mut has_more = true;

        info!(source = source.0, "scanning source");

        while has_more {
            if driver.is_cancelled() {
                info!(source = source.0, "scan cancelled");
                break;
            }

            let page = driver
                .call("getHistoryPage", || {
                    client.history_page(source, offset_id, MAX_PAGE_SIZE)
                })
                .await?;
            if page.is_empty() {
                break;
            }

            for msg in &page {
                if msg.media.document().is_none() {
                    continue;
                }

                let key = msg.message_key();
                if self.store.has_message(&key).await? {
                    continue;
                }
                // Pre-commit: from here on this message is never
                // reconsidered, even if every later step fails.
                self.store.put_message(&key).await?;
                outcome.messages_processed += 1;

                let matched = predicate::matched_keywords(
                    msg,
                    &self.config.filter.video_matches,
                    &self.config.filter.video_exclusions,
                    self.config.filter.min_video_duration_secs,
                );
                if matched.is_empty() {
                    continue;
                }

                if outcome.forwarded_total >= self.config.run.max_forwards {
                    info!(
                        cap = self.config.run.max_forwards,
                        "forward cap reached, stopping scan"
                    );
                    has_more = false;
                    break;
                }

                let Some(candidate) = predicate::extract_candidate(msg, &self.config.dedup)
                else {
                    // Qualified as video but carries no filename: nothing
                    // to dedup against, treat as not a candidate.
                    continue;
                };
                if !within_bounds(&self.config.filter, &candidate) {
                    debug!(
                        file = candidate.file_name.as_str(),
                        size_mb = candidate.size_mb,
                        "candidate outside metadata bounds"
                    );
                    continue;
                }

                if self.handle_candidate(source, &matched, &candidate, &mut outcome).await? {
                    outcome.forwarded_total += 1;
                }
            }

            if let Some(last) = page.last() {
                offset_id = last.id;
            }
            if has_more {
                driver.pause(SCAN_BATCH_PAUSE).await;
            }
        }

        info!(
            source = source.0,
            processed = outcome.messages_processed,
            forwarded_total = outcome.forwarded_total,
            "source scan finished"
        );
        Ok(outcome)
    }

    /// Dedup, replace, and forward one candidate. Returns true when at
    /// least one topic's forward succeeded (one unit toward the cap).
    async fn handle_candidate(
        &mut self,
        source: ChatId,
        matched: &[String],
        candidate: &CandidateVideo,
        outcome: &mut ScanOutcome,
    ) -> Result<bool, VidsiftError> {
        let mut existing = Vec::new();
        let mut new_topics = Vec::new();
        for keyword in matched {
            match self.oracle.find_similar(self.store, candidate, keyword).await? {
                Some(row) => existing.push((keyword.clone(), row)),
                None => new_topics.push(keyword.clone()),
            }
        }

        // A candidate already present everywhere is fully deduplicated --
        // unless a metadata check is enabled, in which case the stored
        // copies are an older version and get replaced below.
        if new_topics.is_empty() && !self.oracle.policy().any_check_enabled() {
            debug!(
                file = candidate.file_name.as_str(),
                "duplicate in every matched topic, skipping"
            );
            return Ok(false);
        }

        if self.config.run.dry_run {
            info!(
                file = candidate.file_name.as_str(),
                topics = ?matched,
                replacing = existing.len(),
                "dry-run: would forward"
            );
            // The decision was made; it counts toward the cap so dry runs
            // mirror real runs. No store video rows, no RPCs.
            return Ok(true);
        }

        // Pre-register before any forward RPC: an identical candidate
        // later in this batch must observe these rows.
        for keyword in &new_topics {
            self.store.put_video(&video_row(candidate, keyword)).await?;
        }

        for (keyword, _) in &existing {
            if let Err(e) = self.replace_duplicates(keyword, candidate).await {
                // The stale destination copy survives; a later cleanup
                // sweep removes it. The new copy is still forwarded.
                warn!(
                    topic = keyword.as_str(),
                    error = %e,
                    "duplicate replacement failed, forwarding anyway"
                );
            }
            self.driver.pause(INTER_DELETE_PAUSE).await;
        }

        // Fan out one forward per matched topic, joined as a barrier.
        let requests: Vec<ForwardRequest> = matched
            .iter()
            .filter_map(|keyword| {
                let Some(topic) = self.topics.get(keyword) else {
                    warn!(keyword = keyword.as_str(), "no topic provisioned for keyword");
                    return None;
                };
                Some(ForwardRequest {
                    source_chat: source,
                    source_message_id: candidate.source_message_id,
                    dest_chat: self.dest_chat,
                    topic: *topic,
                    keyword: keyword.clone(),
                    file_name: candidate.file_name.clone(),
                    duration_secs: candidate.duration_secs,
                    size_mb: candidate.size_mb,
                })
            })
            .collect();

        let forwarder = self.forwarder;
        let results = join_all(
            requests
                .iter()
                .map(|request| async move { (request.keyword.clone(), forwarder.forward(request).await) }),
        )
        .await;

        let mut any_success = false;
        for (keyword, success) in results {
            if success {
                any_success = true;
                *outcome.per_topic.entry(keyword).or_default() += 1;
            }
        }
        Ok(any_success)
    }

    /// Delete the stored duplicates' destination messages for one topic,
    /// purge them from the store, and register the new version.
    async fn replace_duplicates(
        &mut self,
        keyword: &str,
        candidate: &CandidateVideo,
    ) -> Result<(), VidsiftError> {
        let client = self.client;
        let driver = self.driver;
        let topic = *self.topics.get(keyword).ok_or_else(|| {
            VidsiftError::Internal(format!("no topic provisioned for keyword `{keyword}`"))
        })?;

        let duplicates = self
            .oracle
            .find_all_similar(self.store, candidate, keyword)
            .await?;
        if duplicates.is_empty() {
            return Ok(());
        }

        // Match stored rows to cached destination messages by exact
        // normalized name; with metadata checks enabled the cached
        // message must also pass them against the row.
        let mut delete_ids: Vec<i64> = Vec::new();
        {
            let cached = self
                .topic_cache
                .messages(client, driver, self.dest_chat, topic)
                .await?;
            for (id, cached_msg) in cached {
                let Some(doc) = cached_msg.media.document() else {
                    continue;
                };
                let Some(file_name) = doc.file_name.as_deref() else {
                    continue;
                };
                let norm = normalized_name(file_name, self.config.dedup.normalize_filenames);
                let Some(row) = duplicates.iter().find(|d| d.normalized_name == norm) else {
                    continue;
                };
                if self.oracle.policy().any_check_enabled()
                    && !self.oracle.doc_matches_row(doc, row)
                {
                    continue;
                }
                delete_ids.push(*id);
            }
        }

        for chunk in delete_ids.chunks(MAX_DELETE_BATCH) {
            driver
                .call("deleteMessages", || {
                    client.delete_messages(self.dest_chat, chunk)
                })
                .await?;
            self.topic_cache.remove(self.dest_chat, topic, chunk);
            driver.pause(DELETE_BATCH_PAUSE).await;
        }
        if !delete_ids.is_empty() {
            info!(
                topic = keyword,
                deleted = delete_ids.len(),
                file = candidate.file_name.as_str(),
                "replaced stale destination copies"
            );
        }

        let names: HashSet<String> = duplicates
            .iter()
            .map(|d| d.normalized_name.clone())
            .collect();
        let names: Vec<String> = names.into_iter().collect();
        self.store.delete_videos(&names, keyword).await?;
        // Register the incoming version before its forward launches.
        self.store.put_video(&video_row(candidate, keyword)).await?;
        Ok(())
    }
}

/// Size and duration bounds from configuration.
fn within_bounds(filter: &FilterConfig, candidate: &CandidateVideo) -> bool {
    if let Some(min) = filter.min_file_size_mb
        && candidate.size_mb < min
    {
        return false;
    }
    if let Some(max) = filter.max_file_size_mb
        && candidate.size_mb > max
    {
        return false;
    }
    if let Some(max) = filter.max_video_duration_secs
        && candidate.duration_secs.is_some_and(|d| d > max)
    {
        return false;
    }
    true
}

fn video_row(candidate: &CandidateVideo, topic: &str) -> NewProcessedVideo {
    NewProcessedVideo {
        file_name: candidate.file_name.clone(),
        normalized_name: candidate.normalized_name.clone(),
        topic_name: topic.to_string(),
        duration_secs: candidate.duration_secs,
        size_mb: Some(candidate.size_mb),
        width: candidate.width,
        height: candidate.height,
        mime_type: candidate.mime_type.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidsift_core::ChatId;

    fn candidate(size_mb: f64, duration: Option<u32>) -> CandidateVideo {
        CandidateVideo {
            source_chat_id: ChatId(-100),
            source_message_id: 1,
            file_name: "x.mp4".to_string(),
            normalized_name: "x".to_string(),
            duration_secs: duration,
            size_mb,
            width: None,
            height: None,
            mime_type: None,
            caption_lower: String::new(),
            file_name_lower: "x.mp4".to_string(),
        }
    }

    #[test]
    fn bounds_default_accepts_everything() {
        let filter = FilterConfig::default();
        assert!(within_bounds(&filter, &candidate(0.0, None)));
        assert!(within_bounds(&filter, &candidate(10_000.0, Some(86_400))));
    }

    #[test]
    fn size_bounds_are_inclusive() {
        let filter = FilterConfig {
            min_file_size_mb: Some(10.0),
            max_file_size_mb: Some(100.0),
            ..FilterConfig::default()
        };
        assert!(!within_bounds(&filter, &candidate(9.9, None)));
        assert!(within_bounds(&filter, &candidate(10.0, None)));
        assert!(within_bounds(&filter, &candidate(100.0, None)));
        assert!(!within_bounds(&filter, &candidate(100.1, None)));
    }

    #[test]
    fn max_duration_rejects_longer_videos() {
        let filter = FilterConfig {
            max_video_duration_secs: Some(3600),
            ..FilterConfig::default()
        };
        assert!(within_bounds(&filter, &candidate(1.0, Some(3600))));
        assert!(!within_bounds(&filter, &candidate(1.0, Some(3601))));
        // Missing duration is not the bounds check's concern.
        assert!(within_bounds(&filter, &candidate(1.0, None)));
    }

    #[test]
    fn video_row_carries_candidate_metadata() {
        let c = CandidateVideo {
            source_chat_id: ChatId(-1),
            source_message_id: 5,
            file_name: "A.mp4".to_string(),
            normalized_name: "a".to_string(),
            duration_secs: Some(600),
            size_mb: 120.0,
            width: Some(1920),
            height: Some(1080),
            mime_type: Some("video/mp4".to_string()),
            caption_lower: String::new(),
            file_name_lower: "a.mp4".to_string(),
        };
        let row = video_row(&c, "keyword");
        assert_eq!(row.topic_name, "keyword");
        assert_eq!(row.normalized_name, "a");
        assert_eq!(row.size_mb, Some(120.0));
        assert_eq!(row.width, Some(1920));
    }
}

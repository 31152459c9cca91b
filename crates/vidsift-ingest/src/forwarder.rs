// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Republishes one source message into a destination topic and records
//! the forward in the audit log.

use std::sync::Arc;

use tracing::{error, info, warn};

use vidsift_core::{ChatClient, ChatId, TopicId};

use crate::audit::{AuditLog, ForwardAuditEntry};
use crate::driver::RateLimitDriver;

/// Everything the forwarder needs to know about one forward.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub source_chat: ChatId,
    pub source_message_id: i64,
    pub dest_chat: ChatId,
    pub topic: TopicId,
    /// Keyword that selected this topic; names the topic in the audit log.
    pub keyword: String,
    pub file_name: String,
    pub duration_secs: Option<u32>,
    pub size_mb: f64,
}

/// Forward executor shared across the per-candidate fan-out.
pub struct Forwarder {
    client: Arc<dyn ChatClient>,
    driver: RateLimitDriver,
    audit: AuditLog,
}

impl Forwarder {
    pub fn new(client: Arc<dyn ChatClient>, driver: RateLimitDriver, audit: AuditLog) -> Self {
        Self {
            client,
            driver,
            audit,
        }
    }

    /// Forward one source message under one topic. Returns true on
    /// success. The video row was pre-registered by the scanner; this
    /// method never writes the store.
    pub async fn forward(&self, request: &ForwardRequest) -> bool {
        // One nonce per forward; retries reuse it so the protocol can
        // deduplicate a send that succeeded but whose ack was lost.
        let nonce: i64 = rand::random();
        let ids = [request.source_message_id];

        let result = self
            .driver
            .call("forwardMessages", || {
                self.client.forward_messages(
                    request.source_chat,
                    &ids,
                    request.dest_chat,
                    request.topic,
                    nonce,
                )
            })
            .await;

        match result {
            Ok(()) => {
                info!(
                    file = request.file_name.as_str(),
                    topic = request.keyword.as_str(),
                    source = request.source_chat.0,
                    "forwarded video"
                );
                let entry = ForwardAuditEntry {
                    timestamp: chrono::Utc::now().to_rfc3339(),
                    file_name: request.file_name.clone(),
                    matched_keyword: request.keyword.clone(),
                    topic_name: request.keyword.clone(),
                    source_group: request.source_chat.0,
                    duration_secs: request.duration_secs,
                    size_mb: request.size_mb,
                };
                if let Err(e) = self.audit.append(entry).await {
                    // The forward itself succeeded; losing one audit line
                    // must not fail the candidate.
                    warn!(error = %e, "failed to append audit entry");
                }
                true
            }
            Err(e) => {
                error!(
                    file = request.file_name.as_str(),
                    topic = request.keyword.as_str(),
                    error = %e,
                    "forward failed"
                );
                false
            }
        }
    }

    /// The audit log, for end-of-run reporting.
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }
}

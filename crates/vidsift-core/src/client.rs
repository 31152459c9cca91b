// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The narrow trait abstracting the upstream chat protocol.
//!
//! The ingestion pipeline consumes exactly six RPCs. Keeping them behind
//! one trait lets the scanner and sweeper run against an in-memory fake in
//! tests, and keeps every transport detail (session handling, wire
//! encoding) out of the core. All calls are expected to be wrapped by the
//! rate-limit driver; implementations surface raw [`RpcError`]s.

use async_trait::async_trait;

use crate::error::RpcError;
use crate::types::{ChatId, ChatInfo, ChatMessage, TopicId};

/// Protocol ceiling on history/replies page size and delete batch size.
pub const MAX_PAGE_SIZE: usize = 100;

/// Protocol ceiling on the number of messages in one delete call.
pub const MAX_DELETE_BATCH: usize = 100;

/// Client surface of the upstream chat protocol.
///
/// Implementations must lift media into [`MessageMedia`] once at ingress;
/// the pipeline never inspects transport-specific message shapes.
///
/// [`MessageMedia`]: crate::types::MessageMedia
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// List chats accessible to the logged-in account, newest-activity
    /// first, up to `limit`.
    async fn list_chats(&self, limit: usize) -> Result<Vec<ChatInfo>, RpcError>;

    /// One page of a chat's history, newest-first, starting strictly below
    /// `offset_id` (0 means "from the top"). `limit` must be
    /// ≤ [`MAX_PAGE_SIZE`].
    async fn history_page(
        &self,
        chat: ChatId,
        offset_id: i64,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RpcError>;

    /// One page of the messages under a forum topic, newest-first.
    async fn replies_page(
        &self,
        chat: ChatId,
        topic: TopicId,
        offset_id: i64,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RpcError>;

    /// Forward messages into a destination chat under a topic. `nonce`
    /// must be fresh and unique per call; the protocol uses it for its own
    /// deduplication.
    async fn forward_messages(
        &self,
        from: ChatId,
        message_ids: &[i64],
        to: ChatId,
        top_msg_id: TopicId,
        nonce: i64,
    ) -> Result<(), RpcError>;

    /// Delete messages (revoking for all participants). At most
    /// [`MAX_DELETE_BATCH`] ids per call.
    async fn delete_messages(&self, chat: ChatId, message_ids: &[i64]) -> Result<(), RpcError>;

    /// Create (or find) the forum-style destination group with this name.
    async fn provision_forum_group(&self, name: &str) -> Result<ChatId, RpcError>;

    /// Create (or find) a topic with this name inside the destination.
    async fn provision_topic(&self, chat: ChatId, name: &str) -> Result<TopicId, RpcError>;
}

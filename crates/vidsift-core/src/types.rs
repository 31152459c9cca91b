// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the vidsift workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque identifier of a chat on the upstream protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(pub i64);

/// Persistent identifier of a topic inside a forum-style chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TopicId(pub i64);

/// The general (default) topic of a forum chat.
pub const GENERAL_TOPIC: TopicId = TopicId(0);

/// Kind of chat as reported by the upstream protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum ChatKind {
    Group,
    Channel,
    Other,
}

/// A chat visible to the logged-in account.
#[derive(Debug, Clone)]
pub struct ChatInfo {
    pub id: ChatId,
    pub title: String,
    pub kind: ChatKind,
}

/// A document attachment with the protocol's video signals.
///
/// `width` and `height` are either both present or both absent.
#[derive(Debug, Clone, Default)]
pub struct DocumentMedia {
    /// Original filename, when the document carries one.
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub size_bytes: u64,
    /// Protocol-level "this document is a video" flag.
    pub video_flag: bool,
    /// Duration from the document's video attribute, when present.
    pub duration_secs: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl DocumentMedia {
    /// A document qualifies as a video when the protocol flags it as one or
    /// when it carries a video attribute with a duration.
    pub fn is_video(&self) -> bool {
        self.video_flag || self.duration_secs.is_some()
    }

    /// Size in megabytes.
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Media attached to a message, lifted once at ingress to the one
/// distinction the pipeline cares about.
#[derive(Debug, Clone, Default)]
pub enum MessageMedia {
    /// No media, or media without a document.
    #[default]
    None,
    /// A document attachment (possibly a video).
    Document(DocumentMedia),
}

impl MessageMedia {
    /// The attached document, if any.
    pub fn document(&self) -> Option<&DocumentMedia> {
        match self {
            MessageMedia::Document(doc) => Some(doc),
            MessageMedia::None => None,
        }
    }
}

/// A message pulled from a chat history or topic page.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub chat_id: ChatId,
    /// Message identifier, unique within the chat.
    pub id: i64,
    /// Message caption; empty when none.
    pub caption: String,
    pub media: MessageMedia,
    /// Topic this message replies under, when inside a forum chat.
    pub reply_to_top_id: Option<TopicId>,
}

impl ChatMessage {
    /// Composite key identifying this message across all source chats.
    pub fn message_key(&self) -> String {
        message_key(self.chat_id, self.id)
    }
}

/// Composite `(chat, message)` key used for processed-message progress.
pub fn message_key(chat_id: ChatId, message_id: i64) -> String {
    format!("{}:{}", chat_id.0, message_id)
}

/// A video message that passed the predicate, with the metadata the
/// duplicate oracle compares. Derived per message, in-memory only.
#[derive(Debug, Clone)]
pub struct CandidateVideo {
    pub source_chat_id: ChatId,
    pub source_message_id: i64,
    pub file_name: String,
    /// Canonical dedup key derived from `file_name`.
    pub normalized_name: String,
    pub duration_secs: Option<u32>,
    pub size_mb: f64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub mime_type: Option<String>,
    pub caption_lower: String,
    pub file_name_lower: String,
}

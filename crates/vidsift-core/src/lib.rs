// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the vidsift ingestion agent.
//!
//! This crate provides the foundational error types, domain types, and the
//! [`ChatClient`] trait abstracting the upstream chat protocol. Everything
//! else in the workspace builds on these definitions.

pub mod client;
pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use client::{ChatClient, MAX_DELETE_BATCH, MAX_PAGE_SIZE};
pub use error::{RpcError, VidsiftError};
pub use types::{
    message_key, CandidateVideo, ChatId, ChatInfo, ChatKind, ChatMessage, DocumentMedia,
    MessageMedia, TopicId, GENERAL_TOPIC,
};

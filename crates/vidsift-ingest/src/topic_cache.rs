// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lazy in-memory snapshot of the messages under each destination topic.
//!
//! The first access per `(chat, topic)` within a run pulls the topic's
//! replies in pages through the driver; afterwards the cache serves
//! duplicate lookup for deletion and is kept consistent as messages are
//! deleted. Entries live for the process only and are confined to one
//! source's processing context.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use vidsift_core::{ChatClient, ChatId, ChatMessage, TopicId, VidsiftError, MAX_PAGE_SIZE};

use crate::driver::{RateLimitDriver, REPLIES_PAGE_PAUSE};

/// Hard ceiling on pages pulled per topic, preventing runaway runs on
/// pathological topics.
pub const MAX_REPLIES_PAGES: usize = 50;

/// Per-topic message snapshots, keyed by `(destination chat, topic)`.
#[derive(Default)]
pub struct TopicCache {
    entries: HashMap<(ChatId, TopicId), BTreeMap<i64, ChatMessage>>,
}

impl TopicCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The messages under `topic`, loading them on first access.
    pub async fn messages(
        &mut self,
        client: &dyn ChatClient,
        driver: &RateLimitDriver,
        chat: ChatId,
        topic: TopicId,
    ) -> Result<&BTreeMap<i64, ChatMessage>, VidsiftError> {
        let key = (chat, topic);
        if !self.entries.contains_key(&key) {
            let loaded = load_topic(client, driver, chat, topic).await?;
            debug!(chat = chat.0, topic = topic.0, messages = loaded.len(), "topic cache filled");
            self.entries.insert(key, loaded);
        }
        Ok(self.entries.entry(key).or_default())
    }

    /// Drop messages that were deleted from the destination.
    pub fn remove(&mut self, chat: ChatId, topic: TopicId, message_ids: &[i64]) {
        if let Some(messages) = self.entries.get_mut(&(chat, topic)) {
            for id in message_ids {
                messages.remove(id);
            }
        }
    }

    /// Number of cached messages for a topic (0 when not yet loaded).
    pub fn len(&self, chat: ChatId, topic: TopicId) -> usize {
        self.entries
            .get(&(chat, topic))
            .map(BTreeMap::len)
            .unwrap_or(0)
    }
}

async fn load_topic(
    client: &dyn ChatClient,
    driver: &RateLimitDriver,
    chat: ChatId,
    topic: TopicId,
) -> Result<BTreeMap<i64, ChatMessage>, VidsiftError> {
    let mut messages = BTreeMap::new();
    let mut offset_id = 0i64;
    let mut pages = 0usize;

    loop {
        let page = driver
            .call("getRepliesPage", || {
                client.replies_page(chat, topic, offset_id, MAX_PAGE_SIZE)
            })
            .await?;
        if page.is_empty() {
            break;
        }
        for msg in &page {
            messages.insert(msg.id, msg.clone());
        }
        if let Some(last) = page.last() {
            offset_id = last.id;
        }
        pages += 1;
        if pages >= MAX_REPLIES_PAGES {
            warn!(
                chat = chat.0,
                topic = topic.0,
                pages,
                "topic page ceiling reached, snapshot is partial"
            );
            break;
        }
        driver.pause(REPLIES_PAGE_PAUSE).await;
    }

    Ok(messages)
}

// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory implementation of [`ChatClient`] for tests.
//!
//! Holds chats and messages in maps, applies forwards and deletes to its
//! own state, counts every RPC, and can be scripted to fail specific RPCs
//! with chosen errors (flood-wait, network, fatal) on their next calls.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use vidsift_core::{
    ChatClient, ChatId, ChatInfo, ChatKind, ChatMessage, DocumentMedia, MessageMedia, RpcError,
    TopicId,
};

/// One observed forward RPC.
#[derive(Debug, Clone)]
pub struct ForwardRecord {
    pub from: ChatId,
    pub message_ids: Vec<i64>,
    pub to: ChatId,
    pub topic: TopicId,
    pub nonce: i64,
}

#[derive(Default)]
struct ChatState {
    info: Option<ChatInfo>,
    messages: BTreeMap<i64, ChatMessage>,
}

#[derive(Default)]
struct Inner {
    chats: HashMap<ChatId, ChatState>,
    forwards: Vec<ForwardRecord>,
    calls: HashMap<String, u32>,
    failures: HashMap<String, VecDeque<RpcError>>,
    topics_by_group: HashMap<ChatId, BTreeMap<String, TopicId>>,
}

/// Scriptable in-memory chat transport.
#[derive(Default)]
pub struct FakeChatClient {
    inner: Mutex<Inner>,
    next_provisioned_chat: AtomicI64,
    next_message_id: AtomicI64,
    next_topic_id: AtomicI64,
}

impl FakeChatClient {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            next_provisioned_chat: AtomicI64::new(-1_000_000),
            next_message_id: AtomicI64::new(100_000),
            next_topic_id: AtomicI64::new(2),
        }
    }

    /// Register a chat the account can see.
    pub fn add_chat(&self, id: ChatId, title: &str, kind: ChatKind) {
        let mut inner = self.inner.lock().unwrap();
        inner.chats.entry(id).or_default().info = Some(ChatInfo {
            id,
            title: title.to_string(),
            kind,
        });
    }

    /// Place a message into its chat (registering the chat if needed).
    pub fn add_message(&self, msg: ChatMessage) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .chats
            .entry(msg.chat_id)
            .or_default()
            .messages
            .insert(msg.id, msg);
    }

    /// Script the next call of `rpc` to fail with `err`. Multiple scripted
    /// errors for the same RPC are consumed in order.
    pub fn fail_next(&self, rpc: &str, err: RpcError) {
        let mut inner = self.inner.lock().unwrap();
        inner.failures.entry(rpc.to_string()).or_default().push_back(err);
    }

    /// How many times `rpc` has been invoked.
    pub fn calls(&self, rpc: &str) -> u32 {
        let inner = self.inner.lock().unwrap();
        inner.calls.get(rpc).copied().unwrap_or(0)
    }

    /// Every forward RPC observed, in order.
    pub fn forwards(&self) -> Vec<ForwardRecord> {
        self.inner.lock().unwrap().forwards.clone()
    }

    /// All messages currently in `chat`, ascending by id.
    pub fn messages_in(&self, chat: ChatId) -> Vec<ChatMessage> {
        let inner = self.inner.lock().unwrap();
        inner
            .chats
            .get(&chat)
            .map(|c| c.messages.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Messages in `chat` under `topic`, ascending by id.
    pub fn messages_in_topic(&self, chat: ChatId, topic: TopicId) -> Vec<ChatMessage> {
        self.messages_in(chat)
            .into_iter()
            .filter(|m| m.reply_to_top_id == Some(topic))
            .collect()
    }

    /// The provisioned topic map of a destination group, if any.
    pub fn topics_of(&self, group: ChatId) -> BTreeMap<String, TopicId> {
        let inner = self.inner.lock().unwrap();
        inner
            .topics_by_group
            .get(&group)
            .cloned()
            .unwrap_or_default()
    }

    fn record_call(&self, rpc: &str) -> Result<(), RpcError> {
        let mut inner = self.inner.lock().unwrap();
        *inner.calls.entry(rpc.to_string()).or_default() += 1;
        if let Some(queue) = inner.failures.get_mut(rpc)
            && let Some(err) = queue.pop_front()
        {
            return Err(err);
        }
        Ok(())
    }
}

/// Build a video document message for tests.
pub fn video_message(
    chat_id: ChatId,
    id: i64,
    file_name: &str,
    caption: &str,
    duration_secs: u32,
    size_mb: f64,
) -> ChatMessage {
    ChatMessage {
        chat_id,
        id,
        caption: caption.to_string(),
        media: MessageMedia::Document(DocumentMedia {
            file_name: Some(file_name.to_string()),
            mime_type: Some("video/mp4".to_string()),
            size_bytes: (size_mb * 1024.0 * 1024.0) as u64,
            video_flag: true,
            duration_secs: Some(duration_secs),
            width: Some(1920),
            height: Some(1080),
        }),
        reply_to_top_id: None,
    }
}

#[async_trait]
impl ChatClient for FakeChatClient {
    async fn list_chats(&self, limit: usize) -> Result<Vec<ChatInfo>, RpcError> {
        self.record_call("listAccessibleChats")?;
        let inner = self.inner.lock().unwrap();
        let mut chats: Vec<ChatInfo> = inner
            .chats
            .values()
            .filter_map(|c| c.info.clone())
            .collect();
        chats.sort_by_key(|c| c.id);
        chats.truncate(limit);
        Ok(chats)
    }

    async fn history_page(
        &self,
        chat: ChatId,
        offset_id: i64,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RpcError> {
        self.record_call("getHistoryPage")?;
        let inner = self.inner.lock().unwrap();
        let Some(state) = inner.chats.get(&chat) else {
            return Err(RpcError::other("CHANNEL_INVALID", Some(400)));
        };
        Ok(state
            .messages
            .values()
            .rev()
            .filter(|m| offset_id == 0 || m.id < offset_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn replies_page(
        &self,
        chat: ChatId,
        topic: TopicId,
        offset_id: i64,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RpcError> {
        self.record_call("getRepliesPage")?;
        let inner = self.inner.lock().unwrap();
        let Some(state) = inner.chats.get(&chat) else {
            return Err(RpcError::other("CHANNEL_INVALID", Some(400)));
        };
        Ok(state
            .messages
            .values()
            .rev()
            .filter(|m| m.reply_to_top_id == Some(topic))
            .filter(|m| offset_id == 0 || m.id < offset_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn forward_messages(
        &self,
        from: ChatId,
        message_ids: &[i64],
        to: ChatId,
        top_msg_id: TopicId,
        nonce: i64,
    ) -> Result<(), RpcError> {
        self.record_call("forwardMessages")?;
        let mut inner = self.inner.lock().unwrap();

        let mut copies = Vec::new();
        for id in message_ids {
            let Some(source) = inner.chats.get(&from).and_then(|c| c.messages.get(id)) else {
                return Err(RpcError::other("MESSAGE_ID_INVALID", Some(400)));
            };
            let mut copy = source.clone();
            copy.chat_id = to;
            copy.id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
            copy.reply_to_top_id = Some(top_msg_id);
            copies.push(copy);
        }
        let dest = inner.chats.entry(to).or_default();
        for copy in copies {
            dest.messages.insert(copy.id, copy);
        }
        inner.forwards.push(ForwardRecord {
            from,
            message_ids: message_ids.to_vec(),
            to,
            topic: top_msg_id,
            nonce,
        });
        Ok(())
    }

    async fn delete_messages(&self, chat: ChatId, message_ids: &[i64]) -> Result<(), RpcError> {
        self.record_call("deleteMessages")?;
        let mut inner = self.inner.lock().unwrap();
        if let Some(state) = inner.chats.get_mut(&chat) {
            for id in message_ids {
                state.messages.remove(id);
            }
        }
        Ok(())
    }

    async fn provision_forum_group(&self, name: &str) -> Result<ChatId, RpcError> {
        self.record_call("provisionForumGroup")?;
        let mut inner = self.inner.lock().unwrap();
        // Create-or-find by title, like the real provisioner.
        if let Some(existing) = inner
            .chats
            .values()
            .filter_map(|c| c.info.as_ref())
            .find(|info| info.title == name)
        {
            return Ok(existing.id);
        }
        let id = ChatId(self.next_provisioned_chat.fetch_sub(1, Ordering::SeqCst));
        inner.chats.entry(id).or_default().info = Some(ChatInfo {
            id,
            title: name.to_string(),
            kind: ChatKind::Group,
        });
        Ok(id)
    }

    async fn provision_topic(&self, chat: ChatId, name: &str) -> Result<TopicId, RpcError> {
        self.record_call("provisionTopic")?;
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner
            .topics_by_group
            .get(&chat)
            .and_then(|topics| topics.get(name))
        {
            return Ok(*existing);
        }
        let id = TopicId(self.next_topic_id.fetch_add(1, Ordering::SeqCst));
        inner
            .topics_by_group
            .entry(chat)
            .or_default()
            .insert(name.to_string(), id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn history_pages_walk_backward() {
        let client = FakeChatClient::new();
        let chat = ChatId(-100);
        for id in 1..=5 {
            client.add_message(video_message(chat, id, "v.mp4", "", 600, 10.0));
        }

        let page = client.history_page(chat, 0, 2).await.unwrap();
        let ids: Vec<i64> = page.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![5, 4]);

        let page = client.history_page(chat, 4, 2).await.unwrap();
        let ids: Vec<i64> = page.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 2]);

        let page = client.history_page(chat, 1, 2).await.unwrap();
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn forward_copies_into_topic() {
        let client = FakeChatClient::new();
        let source = ChatId(-100);
        let dest = ChatId(-200);
        client.add_message(video_message(source, 1, "v.mp4", "cap", 600, 10.0));

        client
            .forward_messages(source, &[1], dest, TopicId(7), 42)
            .await
            .unwrap();

        let in_topic = client.messages_in_topic(dest, TopicId(7));
        assert_eq!(in_topic.len(), 1);
        assert_eq!(in_topic[0].caption, "cap");
        assert_eq!(client.forwards().len(), 1);
        assert_eq!(client.forwards()[0].nonce, 42);
    }

    #[tokio::test]
    async fn scripted_failures_are_consumed_in_order() {
        let client = FakeChatClient::new();
        client.add_chat(ChatId(-1), "c", ChatKind::Group);
        client.fail_next("getHistoryPage", RpcError::flood_wait(1));

        assert!(client.history_page(ChatId(-1), 0, 10).await.is_err());
        assert!(client.history_page(ChatId(-1), 0, 10).await.is_ok());
        assert_eq!(client.calls("getHistoryPage"), 2);
    }

    #[tokio::test]
    async fn provision_topic_is_idempotent_per_name() {
        let client = FakeChatClient::new();
        let group = client.provision_forum_group("Sorted").await.unwrap();
        let a = client.provision_topic(group, "keyword").await.unwrap();
        let b = client.provision_topic(group, "keyword").await.unwrap();
        assert_eq!(a, b);
        let c = client.provision_topic(group, "other").await.unwrap();
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn delete_removes_messages() {
        let client = FakeChatClient::new();
        let chat = ChatId(-100);
        client.add_message(video_message(chat, 1, "a.mp4", "", 600, 10.0));
        client.add_message(video_message(chat, 2, "b.mp4", "", 600, 10.0));

        client.delete_messages(chat, &[1]).await.unwrap();
        let remaining = client.messages_in(chat);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, 2);
    }
}

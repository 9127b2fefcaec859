//! 消息内存存储
//!
//! 每个会话维护插入顺序的 id 列表。可见性过滤（过期 + 单侧
//! 隐藏）在取分页窗口之前应用，窗口取最新一页、以最旧在前
//! 返回。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use domain::{
    ConversationId, DeliveryStatus, Message, MessageId, MessageRepository, RepositoryError,
    RepositoryResult, Timestamp, UserId,
};

#[derive(Default)]
struct State {
    messages: HashMap<MessageId, Message>,
    by_conversation: HashMap<ConversationId, Vec<MessageId>>,
}

impl State {
    /// 会话内对 viewer 可见的消息，最旧在前。
    fn visible(&self, conversation: ConversationId, viewer: UserId, now: Timestamp) -> Vec<&Message> {
        self.by_conversation
            .get(&conversation)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.messages.get(id))
                    .filter(|m| m.is_visible_to(viewer, now))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// 内存消息存储
#[derive(Default)]
pub struct MemoryMessageStore {
    state: RwLock<State>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for MemoryMessageStore {
    async fn create(&self, message: Message) -> RepositoryResult<Message> {
        let mut state = self.state.write().await;
        if state.messages.contains_key(&message.id) {
            return Err(RepositoryError::conflict("message id already exists"));
        }
        state
            .by_conversation
            .entry(message.conversation_id)
            .or_default()
            .push(message.id);
        state.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn find_by_id(&self, id: MessageId) -> RepositoryResult<Option<Message>> {
        Ok(self.state.read().await.messages.get(&id).cloned())
    }

    async fn update(&self, message: Message) -> RepositoryResult<Message> {
        let mut state = self.state.write().await;
        if !state.messages.contains_key(&message.id) {
            return Err(RepositoryError::not_found("message not found"));
        }
        state.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn list_visible(
        &self,
        conversation: ConversationId,
        viewer: UserId,
        now: Timestamp,
        limit: u32,
        offset: u32,
    ) -> RepositoryResult<Vec<Message>> {
        let state = self.state.read().await;
        let visible = state.visible(conversation, viewer, now);
        // 从最新端取窗口，再恢复最旧在前的顺序
        let mut page: Vec<Message> = visible
            .iter()
            .rev()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|m| (*m).clone())
            .collect();
        page.reverse();
        Ok(page)
    }

    async fn last_visible(
        &self,
        conversation: ConversationId,
        viewer: UserId,
        now: Timestamp,
    ) -> RepositoryResult<Option<Message>> {
        let state = self.state.read().await;
        Ok(state
            .visible(conversation, viewer, now)
            .last()
            .map(|m| (*m).clone()))
    }

    async fn count_unread_for(
        &self,
        conversation: ConversationId,
        viewer: UserId,
        now: Timestamp,
    ) -> RepositoryResult<u64> {
        let state = self.state.read().await;
        let count = state
            .visible(conversation, viewer, now)
            .iter()
            .filter(|m| m.sender_id != viewer && m.delivery_status != DeliveryStatus::Read)
            .count();
        Ok(count as u64)
    }

    async fn update_status(
        &self,
        id: MessageId,
        status: DeliveryStatus,
    ) -> RepositoryResult<Option<Message>> {
        let mut state = self.state.write().await;
        let Some(message) = state.messages.get_mut(&id) else {
            return Ok(None);
        };
        message.advance_status(status);
        Ok(Some(message.clone()))
    }

    async fn mark_read_from_sender(
        &self,
        conversation: ConversationId,
        sender: UserId,
    ) -> RepositoryResult<u64> {
        let mut state = self.state.write().await;
        let ids: Vec<MessageId> = state
            .by_conversation
            .get(&conversation)
            .cloned()
            .unwrap_or_default();
        let mut updated = 0u64;
        for id in ids {
            if let Some(message) = state.messages.get_mut(&id) {
                if message.sender_id == sender && message.advance_status(DeliveryStatus::Read) {
                    updated += 1;
                }
            }
        }
        Ok(updated)
    }

    async fn delete(&self, id: MessageId) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        if let Some(message) = state.messages.remove(&id) {
            if let Some(ids) = state.by_conversation.get_mut(&message.conversation_id) {
                ids.retain(|existing| *existing != id);
            }
        }
        Ok(())
    }

    async fn delete_by_conversation(&self, conversation: ConversationId) -> RepositoryResult<u64> {
        let mut state = self.state.write().await;
        let ids = state.by_conversation.remove(&conversation).unwrap_or_default();
        let mut deleted = 0u64;
        for id in ids {
            if state.messages.remove(&id).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

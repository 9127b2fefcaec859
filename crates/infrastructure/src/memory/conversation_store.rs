//! 会话内存存储
//!
//! 以规范化的无序用户对为主键，id 索引只是二级映射。
//! `find_or_create` 在单个写锁内完成查找与插入，同一对用户
//! 的并发调用收敛到同一条记录。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use domain::{
    Conversation, ConversationId, ConversationRepository, RepositoryError, RepositoryResult,
    Timestamp, UserId, UserPair,
};

#[derive(Default)]
struct State {
    by_pair: HashMap<UserPair, Conversation>,
    by_id: HashMap<ConversationId, UserPair>,
}

/// 内存会话存储
#[derive(Default)]
pub struct MemoryConversationStore {
    state: RwLock<State>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationRepository for MemoryConversationStore {
    async fn find_or_create(
        &self,
        pair: UserPair,
        now: Timestamp,
    ) -> RepositoryResult<(Conversation, bool)> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.by_pair.get(&pair) {
            return Ok((existing.clone(), false));
        }
        let conversation = Conversation::new(pair, now);
        state.by_id.insert(conversation.id, pair);
        state.by_pair.insert(pair, conversation.clone());
        Ok((conversation, true))
    }

    async fn find_by_id(&self, id: ConversationId) -> RepositoryResult<Option<Conversation>> {
        let state = self.state.read().await;
        Ok(state
            .by_id
            .get(&id)
            .and_then(|pair| state.by_pair.get(pair))
            .cloned())
    }

    async fn list_by_user(&self, user: UserId) -> RepositoryResult<Vec<Conversation>> {
        Ok(self
            .state
            .read()
            .await
            .by_pair
            .values()
            .filter(|c| c.involves(user))
            .cloned()
            .collect())
    }

    async fn find_by_pair(&self, pair: UserPair) -> RepositoryResult<Option<Conversation>> {
        Ok(self.state.read().await.by_pair.get(&pair).cloned())
    }

    async fn set_disappearing_timer(
        &self,
        id: ConversationId,
        seconds: Option<u32>,
    ) -> RepositoryResult<Conversation> {
        let mut state = self.state.write().await;
        let pair = *state
            .by_id
            .get(&id)
            .ok_or_else(|| RepositoryError::not_found("conversation not found"))?;
        let conversation = state
            .by_pair
            .get_mut(&pair)
            .ok_or_else(|| RepositoryError::storage("pair index out of sync"))?;
        conversation.disappearing_timer_secs = seconds;
        Ok(conversation.clone())
    }

    async fn delete(&self, id: ConversationId) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        if let Some(pair) = state.by_id.remove(&id) {
            state.by_pair.remove(&pair);
        }
        Ok(())
    }
}

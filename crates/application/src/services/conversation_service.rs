//! 会话服务
//!
//! 无序用户对的去重查找/创建，会话视图（未读数 + 最后一条
//! 可见消息），以及删除时的消息级联。并发安全性依赖存储层
//! 规范化对上的唯一约束，本组件从不假设单写者。

use std::sync::Arc;

use chrono::Utc;

use domain::{
    Conversation, ConversationId, ConversationRepository, MessageRepository, UserId, UserPair,
    UserRepository,
};

use crate::errors::{ApplicationError, ApplicationResult};
use crate::views::ConversationView;

/// 会话服务
pub struct ConversationService {
    conversations: Arc<dyn ConversationRepository>,
    messages: Arc<dyn MessageRepository>,
    users: Arc<dyn UserRepository>,
}

impl ConversationService {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        messages: Arc<dyn MessageRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            conversations,
            messages,
            users,
        }
    }

    /// 按无序对查找，未命中则创建。
    pub async fn find_or_create(&self, a: UserId, b: UserId) -> ApplicationResult<Conversation> {
        let pair = UserPair::new(a, b)?;
        let (conversation, created) = self.conversations.find_or_create(pair, Utc::now()).await?;
        if created {
            tracing::debug!(conversation_id = %conversation.id, "会话已创建");
        }
        Ok(conversation)
    }

    pub async fn get(&self, id: ConversationId) -> ApplicationResult<Conversation> {
        self.conversations
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Conversation not found"))
    }

    pub async fn find_by_users(
        &self,
        a: UserId,
        b: UserId,
    ) -> ApplicationResult<Option<Conversation>> {
        let pair = UserPair::new(a, b)?;
        Ok(self.conversations.find_by_pair(pair).await?)
    }

    /// 观察者视角的会话列表：对侧参与者、未读数、最后一条可见消息。
    pub async fn views_for_user(&self, viewer: UserId) -> ApplicationResult<Vec<ConversationView>> {
        let now = Utc::now();
        let mut views = Vec::new();
        for conversation in self.conversations.list_by_user(viewer).await? {
            let Some(counterpart_id) = conversation.counterpart(viewer) else {
                continue;
            };
            let Some(counterpart) = self.users.find_by_id(counterpart_id).await? else {
                continue;
            };
            let unread = self
                .messages
                .count_unread_for(conversation.id, viewer, now)
                .await?;
            let last = self.messages.last_visible(conversation.id, viewer, now).await?;
            views.push(ConversationView::new(
                &conversation,
                &counterpart,
                unread,
                last.as_ref(),
            ));
        }
        Ok(views)
    }

    /// 删除会话：参与者门禁，先删消息再删会话行。
    pub async fn delete(
        &self,
        id: ConversationId,
        caller: UserId,
    ) -> ApplicationResult<Conversation> {
        let conversation = self.get(id).await?;
        if !conversation.involves(caller) {
            return Err(ApplicationError::unauthorized("Unauthorized"));
        }
        let deleted = self.messages.delete_by_conversation(id).await?;
        self.conversations.delete(id).await?;
        tracing::debug!(
            conversation_id = %id,
            user_id = %caller,
            deleted_messages = deleted,
            "会话已删除"
        );
        Ok(conversation)
    }

    /// 解除好友/拉黑路径的会话清理：按对查找并级联删除。
    /// 没有会话时为空操作。
    pub async fn teardown_between(
        &self,
        a: UserId,
        b: UserId,
    ) -> ApplicationResult<Option<ConversationId>> {
        let pair = UserPair::new(a, b)?;
        let Some(conversation) = self.conversations.find_by_pair(pair).await? else {
            return Ok(None);
        };
        self.messages.delete_by_conversation(conversation.id).await?;
        self.conversations.delete(conversation.id).await?;
        Ok(Some(conversation.id))
    }

    /// 更新阅后即焚定时器；参与者门禁。`None` 表示关闭。
    pub async fn set_disappearing_timer(
        &self,
        id: ConversationId,
        caller: UserId,
        seconds: Option<u32>,
    ) -> ApplicationResult<Conversation> {
        let conversation = self.get(id).await?;
        if !conversation.involves(caller) {
            return Err(ApplicationError::unauthorized("Unauthorized"));
        }
        Ok(self.conversations.set_disappearing_timer(id, seconds).await?)
    }
}

//! 消息实体定义
//!
//! 包含投递状态、阅后即焚过期时间、单侧隐藏集合、表情回应
//! 等核心信息，以及对应的纯函数操作。可见性判断不依赖任何
//! 后台清理任务：过期消息在读路径上直接被过滤。

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::delivery::DeliveryStatus;
use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{ConversationId, MessageId, Timestamp, UserId};

/// 消息类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// 文本消息
    Text,
    /// 轻触（空内容、永不过期）
    Ping,
    /// 图片消息
    Image,
    /// 手绘消息
    Drawing,
    /// 语音消息
    Voice,
}

impl Default for MessageType {
    fn default() -> Self {
        Self::Text
    }
}

impl MessageType {
    /// 该类型是否允许空文本内容。
    pub fn allows_empty_content(self) -> bool {
        !matches!(self, Self::Text)
    }
}

/// 创建消息时的可选参数
#[derive(Debug, Clone, Default)]
pub struct MessageDraft {
    pub message_type: MessageType,
    pub expires_at: Option<Timestamp>,
    pub media_url: Option<String>,
    pub media_duration_secs: Option<u32>,
    pub reply_to: Option<MessageId>,
}

/// 消息实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// 消息唯一ID
    pub id: MessageId,
    /// 所属会话
    pub conversation_id: ConversationId,
    /// 发送者
    pub sender_id: UserId,
    /// 消息内容
    pub content: String,
    /// 消息类型
    pub message_type: MessageType,
    /// 投递状态（只会单调推进）
    pub delivery_status: DeliveryStatus,
    /// 过期时间；到期后任何读路径都不得返回该消息
    pub expires_at: Option<Timestamp>,
    /// 媒体地址（外部存储的不透明 URL）
    pub media_url: Option<String>,
    /// 媒体时长（秒，语音消息使用）
    pub media_duration_secs: Option<u32>,
    /// "对我删除"的用户集合；只影响各自的可见性
    pub hidden_by: HashSet<UserId>,
    /// 表情回应：emoji -> 用户集合。每个用户最多持有一个 emoji
    pub reactions: BTreeMap<String, BTreeSet<UserId>>,
    /// 被回复的消息ID（同一会话内）
    pub reply_to: Option<MessageId>,
    /// 创建时间
    pub created_at: Timestamp,
}

impl Message {
    pub fn new(
        conversation_id: ConversationId,
        sender_id: UserId,
        content: impl Into<String>,
        draft: MessageDraft,
        now: Timestamp,
    ) -> DomainResult<Self> {
        let content = content.into();
        if content.trim().is_empty() && !draft.message_type.allows_empty_content() {
            return Err(DomainError::validation("content", "cannot be empty"));
        }

        Ok(Self {
            id: MessageId::from(Uuid::new_v4()),
            conversation_id,
            sender_id,
            content,
            message_type: draft.message_type,
            delivery_status: DeliveryStatus::Sent,
            expires_at: draft.expires_at,
            media_url: draft.media_url,
            media_duration_secs: draft.media_duration_secs,
            hidden_by: HashSet::new(),
            reactions: BTreeMap::new(),
            reply_to: draft.reply_to,
            created_at: now,
        })
    }

    /// 消息是否已过期。与清理任务无关，读路径直接判断。
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// 指定用户是否已对自己隐藏该消息。
    pub fn is_hidden_for(&self, user: UserId) -> bool {
        self.hidden_by.contains(&user)
    }

    /// 读路径的统一可见性判定：未过期且未被该用户隐藏。
    pub fn is_visible_to(&self, viewer: UserId, now: Timestamp) -> bool {
        !self.is_expired(now) && !self.is_hidden_for(viewer)
    }

    /// "对我删除"：幂等地把用户加入隐藏集合，不影响其他人。
    pub fn hide_for(&mut self, user: UserId) {
        self.hidden_by.insert(user);
    }

    /// 单调推进投递状态；实际推进时返回 true。
    pub fn advance_status(&mut self, next: DeliveryStatus) -> bool {
        match self.delivery_status.advance(next) {
            Some(status) => {
                self.delivery_status = status;
                true
            }
            None => false,
        }
    }

    /// 设置用户的表情回应。每个用户在一条消息上最多持有一个
    /// emoji：设置新值时原子地清掉旧值。重复设置同一 emoji 幂等。
    pub fn set_reaction(&mut self, user: UserId, emoji: impl Into<String>) {
        let emoji = emoji.into();
        self.clear_reaction(user);
        self.reactions.entry(emoji).or_default().insert(user);
    }

    /// 移除用户对指定 emoji 的回应；空集合随之清除。
    pub fn remove_reaction(&mut self, user: UserId, emoji: &str) {
        if let Some(users) = self.reactions.get_mut(emoji) {
            users.remove(&user);
            if users.is_empty() {
                self.reactions.remove(emoji);
            }
        }
    }

    fn clear_reaction(&mut self, user: UserId) {
        self.reactions.retain(|_, users| {
            users.remove(&user);
            !users.is_empty()
        });
    }

    /// 用户当前持有的 emoji（最多一个）。
    pub fn reaction_of(&self, user: UserId) -> Option<&str> {
        self.reactions
            .iter()
            .find(|(_, users)| users.contains(&user))
            .map(|(emoji, _)| emoji.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn text_message(sender: UserId) -> Message {
        Message::new(
            ConversationId::from(Uuid::new_v4()),
            sender,
            "hello",
            MessageDraft::default(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn empty_text_content_is_rejected() {
        let result = Message::new(
            ConversationId::from(Uuid::new_v4()),
            UserId::from(Uuid::new_v4()),
            "   ",
            MessageDraft::default(),
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn ping_allows_empty_content() {
        let draft = MessageDraft {
            message_type: MessageType::Ping,
            ..Default::default()
        };
        let result = Message::new(
            ConversationId::from(Uuid::new_v4()),
            UserId::from(Uuid::new_v4()),
            "",
            draft,
            Utc::now(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn expired_message_is_invisible_without_cleanup() {
        let sender = UserId::from(Uuid::new_v4());
        let viewer = UserId::from(Uuid::new_v4());
        let mut message = text_message(sender);

        let now = Utc::now();
        message.expires_at = Some(now - Duration::seconds(1));
        assert!(message.is_expired(now));
        assert!(!message.is_visible_to(viewer, now));

        // 未到期则可见
        message.expires_at = Some(now + Duration::seconds(60));
        assert!(message.is_visible_to(viewer, now));
    }

    #[test]
    fn hide_only_affects_the_hiding_user() {
        let sender = UserId::from(Uuid::new_v4());
        let other = UserId::from(Uuid::new_v4());
        let mut message = text_message(sender);

        message.hide_for(sender);
        message.hide_for(sender); // 幂等
        assert_eq!(message.hidden_by.len(), 1);

        let now = Utc::now();
        assert!(!message.is_visible_to(sender, now));
        assert!(message.is_visible_to(other, now));
    }

    #[test]
    fn status_never_regresses() {
        let mut message = text_message(UserId::from(Uuid::new_v4()));
        assert_eq!(message.delivery_status, DeliveryStatus::Sent);

        assert!(message.advance_status(DeliveryStatus::Read));
        assert!(!message.advance_status(DeliveryStatus::Delivered));
        assert_eq!(message.delivery_status, DeliveryStatus::Read);
    }

    #[test]
    fn reaction_replaces_previous_emoji() {
        let user = UserId::from(Uuid::new_v4());
        let mut message = text_message(UserId::from(Uuid::new_v4()));

        message.set_reaction(user, "👍");
        message.set_reaction(user, "👍"); // 幂等
        assert_eq!(message.reactions.get("👍").unwrap().len(), 1);

        message.set_reaction(user, "❤️");
        assert!(message.reactions.get("👍").is_none());
        assert!(message.reactions.get("❤️").unwrap().contains(&user));
        assert_eq!(message.reaction_of(user), Some("❤️"));
    }

    #[test]
    fn remove_reaction_drops_empty_entry() {
        let user = UserId::from(Uuid::new_v4());
        let mut message = text_message(UserId::from(Uuid::new_v4()));

        message.set_reaction(user, "👍");
        message.remove_reaction(user, "👍");
        assert!(message.reactions.is_empty());
        assert_eq!(message.reaction_of(user), None);
    }
}

//! 消息服务
//!
//! 发送链路上的授权闸（拉黑否决 + 好友门禁）、阅后即焚过期
//! 时间的推算（显式参数优先，否则落到会话定时器）、历史分页、
//! 投递状态推进、表情回应与两种删除语义（单侧隐藏 / 全员删除）。

use std::sync::Arc;

use chrono::{Duration, Utc};

use config::AppConfig;
use domain::{
    Conversation, ConversationId, DeliveryStatus, Message, MessageDraft, MessageId,
    MessageRepository, MessageType, UserId,
};

use crate::errors::{ApplicationError, ApplicationResult};
use crate::services::block_service::BlockService;
use crate::services::conversation_service::ConversationService;
use crate::services::friendship_service::FriendshipService;

/// 发送消息的输入参数
#[derive(Debug, Clone)]
pub struct SendMessageCommand {
    pub sender_id: UserId,
    pub recipient_id: UserId,
    pub content: String,
    pub message_type: MessageType,
    /// 显式过期秒数；缺省时回退到会话的阅后即焚定时器
    pub expires_in_secs: Option<u32>,
    pub media_url: Option<String>,
    pub media_duration_secs: Option<u32>,
    pub reply_to: Option<MessageId>,
}

impl SendMessageCommand {
    pub fn text(sender_id: UserId, recipient_id: UserId, content: impl Into<String>) -> Self {
        Self {
            sender_id,
            recipient_id,
            content: content.into(),
            message_type: MessageType::Text,
            expires_in_secs: None,
            media_url: None,
            media_duration_secs: None,
            reply_to: None,
        }
    }
}

/// 消息服务
pub struct MessageService {
    messages: Arc<dyn MessageRepository>,
    conversations: Arc<ConversationService>,
    friendship: Arc<FriendshipService>,
    blocks: Arc<BlockService>,
    config: AppConfig,
}

impl MessageService {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        conversations: Arc<ConversationService>,
        friendship: Arc<FriendshipService>,
        blocks: Arc<BlockService>,
        config: AppConfig,
    ) -> Self {
        Self {
            messages,
            conversations,
            friendship,
            blocks,
            config,
        }
    }

    /// 发送消息。
    ///
    /// 授权顺序：拉黑否决在前（任一方向拉黑即拒绝），好友门禁
    /// 在后。会话不存在时创建。Ping 永不过期，即使会话开着
    /// 阅后即焚定时器。
    pub async fn send(
        &self,
        command: SendMessageCommand,
    ) -> ApplicationResult<(Message, Conversation)> {
        if command.sender_id == command.recipient_id {
            return Err(ApplicationError::conflict("Cannot message yourself"));
        }
        if self
            .blocks
            .is_blocked_by_either(command.sender_id, command.recipient_id)
            .await?
        {
            return Err(ApplicationError::unauthorized("User is not available"));
        }
        if !self
            .friendship
            .are_friends(command.sender_id, command.recipient_id)
            .await?
        {
            return Err(ApplicationError::unauthorized(
                "You can only message friends",
            ));
        }
        if command.content.chars().count() > self.config.message.max_content_length {
            return Err(ApplicationError::validation("Message content too long"));
        }

        let conversation = self
            .conversations
            .find_or_create(command.sender_id, command.recipient_id)
            .await?;

        if let Some(reply_to) = command.reply_to {
            let target = self.require_message(reply_to).await?;
            if target.conversation_id != conversation.id {
                return Err(ApplicationError::validation(
                    "Reply target is not in this conversation",
                ));
            }
        }

        let now = Utc::now();
        let expires_at = if command.message_type == MessageType::Ping {
            None
        } else {
            command
                .expires_in_secs
                .or(conversation.disappearing_timer_secs)
                .map(|secs| now + Duration::seconds(i64::from(secs)))
        };

        let draft = MessageDraft {
            message_type: command.message_type,
            expires_at,
            media_url: command.media_url,
            media_duration_secs: command.media_duration_secs,
            reply_to: command.reply_to,
        };
        let message = Message::new(
            conversation.id,
            command.sender_id,
            command.content,
            draft,
            now,
        )?;
        let message = self.messages.create(message).await?;
        tracing::debug!(
            message_id = %message.id,
            conversation_id = %conversation.id,
            sender_id = %command.sender_id,
            message_type = ?message.message_type,
            "消息已发送"
        );
        Ok((message, conversation))
    }

    /// 发送轻触。空内容、永不过期的特化发送路径。
    pub async fn send_ping(
        &self,
        sender: UserId,
        recipient: UserId,
    ) -> ApplicationResult<(Message, Conversation)> {
        self.send(SendMessageCommand {
            sender_id: sender,
            recipient_id: recipient,
            content: String::new(),
            message_type: MessageType::Ping,
            expires_in_secs: None,
            media_url: None,
            media_duration_secs: None,
            reply_to: None,
        })
        .await
    }

    /// 历史分页：只返回对 `viewer` 可见的消息，最旧在前。
    /// limit 缺省取配置默认值，超过上限时被钳制。
    pub async fn history(
        &self,
        conversation_id: ConversationId,
        viewer: UserId,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> ApplicationResult<Vec<Message>> {
        let conversation = self.conversations.get(conversation_id).await?;
        if !conversation.involves(viewer) {
            return Err(ApplicationError::unauthorized("Unauthorized"));
        }
        let limit = limit
            .unwrap_or(self.config.history.default_limit)
            .min(self.config.history.max_limit);
        Ok(self
            .messages
            .list_visible(
                conversation_id,
                viewer,
                Utc::now(),
                limit,
                offset.unwrap_or(0),
            )
            .await?)
    }

    /// 投递确认：推进到 DELIVERED。消息已不存在（过期删除、
    /// 全员删除）时返回 `None`，调用方应当静默忽略。
    pub async fn mark_delivered(&self, id: MessageId) -> ApplicationResult<Option<Message>> {
        Ok(self
            .messages
            .update_status(id, DeliveryStatus::Delivered)
            .await?)
    }

    /// 把对侧发来的消息整批置为 READ。
    /// 返回实际推进的行数和对侧用户ID。
    pub async fn mark_conversation_read(
        &self,
        conversation_id: ConversationId,
        reader: UserId,
    ) -> ApplicationResult<(u64, UserId)> {
        let conversation = self.conversations.get(conversation_id).await?;
        let Some(counterpart) = conversation.counterpart(reader) else {
            return Err(ApplicationError::unauthorized("Unauthorized"));
        };
        let updated = self
            .messages
            .mark_read_from_sender(conversation_id, counterpart)
            .await?;
        Ok((updated, counterpart))
    }

    /// 设置表情回应；同一用户在同一消息上最多持有一个 emoji。
    pub async fn set_reaction(
        &self,
        message_id: MessageId,
        user: UserId,
        emoji: &str,
    ) -> ApplicationResult<(Message, Conversation)> {
        if emoji.trim().is_empty() {
            return Err(ApplicationError::validation("Reaction cannot be empty"));
        }
        if emoji.chars().count() > self.config.message.max_reaction_length {
            return Err(ApplicationError::validation("Reaction too long"));
        }
        let (mut message, conversation) = self.require_participant_message(message_id, user).await?;
        message.set_reaction(user, emoji);
        let message = self.messages.update(message).await?;
        Ok((message, conversation))
    }

    /// 移除表情回应。不持有该 emoji 时为空操作。
    pub async fn remove_reaction(
        &self,
        message_id: MessageId,
        user: UserId,
        emoji: &str,
    ) -> ApplicationResult<(Message, Conversation)> {
        let (mut message, conversation) = self.require_participant_message(message_id, user).await?;
        message.remove_reaction(user, emoji);
        let message = self.messages.update(message).await?;
        Ok((message, conversation))
    }

    /// "对我删除"：只影响调用方自己的可见性，对侧不受影响。
    pub async fn hide_for_user(
        &self,
        message_id: MessageId,
        user: UserId,
    ) -> ApplicationResult<Message> {
        let (mut message, _) = self.require_participant_message(message_id, user).await?;
        message.hide_for(user);
        Ok(self.messages.update(message).await?)
    }

    /// 全员删除：只有发送者可以，硬删除整行。
    pub async fn delete_for_everyone(
        &self,
        message_id: MessageId,
        caller: UserId,
    ) -> ApplicationResult<(MessageId, ConversationId)> {
        let message = self.require_message(message_id).await?;
        if message.sender_id != caller {
            return Err(ApplicationError::unauthorized(
                "Only the sender can delete for everyone",
            ));
        }
        self.messages.delete(message_id).await?;
        tracing::debug!(message_id = %message_id, user_id = %caller, "消息已全员删除");
        Ok((message_id, message.conversation_id))
    }

    async fn require_message(&self, id: MessageId) -> ApplicationResult<Message> {
        self.messages
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Message not found"))
    }

    /// 查找消息并校验调用方是会话参与者。
    async fn require_participant_message(
        &self,
        id: MessageId,
        user: UserId,
    ) -> ApplicationResult<(Message, Conversation)> {
        let message = self.require_message(id).await?;
        let conversation = self.conversations.get(message.conversation_id).await?;
        if !conversation.involves(user) {
            return Err(ApplicationError::unauthorized("Unauthorized"));
        }
        Ok((message, conversation))
    }
}

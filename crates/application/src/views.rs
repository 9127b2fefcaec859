//! 推送给客户端的视图模型
//!
//! 实体到线格式的映射。字段名使用 camelCase，与原有协议保持一致。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use domain::{
    Conversation, ConversationId, DeliveryStatus, FriendRequest, FriendRequestStatus, Message,
    MessageId, MessageType, RequestId, Timestamp, User, UserId,
};

/// 用户视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub tag: String,
    pub handle: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            tag: user.tag.clone(),
            handle: user.handle(),
        }
    }
}

/// 好友请求视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestView {
    pub id: RequestId,
    pub sender: UserView,
    pub receiver: UserView,
    pub status: FriendRequestStatus,
    pub created_at: Timestamp,
    pub responded_at: Option<Timestamp>,
}

impl FriendRequestView {
    pub fn new(request: &FriendRequest, sender: &User, receiver: &User) -> Self {
        Self {
            id: request.id,
            sender: UserView::from(sender),
            receiver: UserView::from(receiver),
            status: request.status,
            created_at: request.created_at,
            responded_at: request.responded_at,
        }
    }
}

/// 消息视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    pub message_type: MessageType,
    pub delivery_status: DeliveryStatus,
    pub expires_at: Option<Timestamp>,
    pub media_url: Option<String>,
    pub media_duration_secs: Option<u32>,
    pub reply_to_message_id: Option<MessageId>,
    pub reactions: BTreeMap<String, Vec<UserId>>,
    pub created_at: Timestamp,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            content: message.content.clone(),
            message_type: message.message_type,
            delivery_status: message.delivery_status,
            expires_at: message.expires_at,
            media_url: message.media_url.clone(),
            media_duration_secs: message.media_duration_secs,
            reply_to_message_id: message.reply_to,
            reactions: message
                .reactions
                .iter()
                .map(|(emoji, users)| (emoji.clone(), users.iter().copied().collect()))
                .collect(),
            created_at: message.created_at,
        }
    }
}

/// 会话视图（相对某个观察者：对侧参与者、未读数、最后一条可见消息）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    pub id: ConversationId,
    pub participant: UserView,
    pub disappearing_timer_secs: Option<u32>,
    pub unread_count: u64,
    pub last_message: Option<MessageView>,
    pub created_at: Timestamp,
}

impl ConversationView {
    pub fn new(
        conversation: &Conversation,
        counterpart: &User,
        unread_count: u64,
        last_message: Option<&Message>,
    ) -> Self {
        Self {
            id: conversation.id,
            participant: UserView::from(counterpart),
            disappearing_timer_secs: conversation.disappearing_timer_secs,
            unread_count,
            last_message: last_message.map(MessageView::from),
            created_at: conversation.created_at,
        }
    }
}

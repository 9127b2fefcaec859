//! 入站/出站事件的强类型联合
//!
//! 松散的事件载荷在边界处解析成这里的带标签联合，再进入核心。
//! 事件名与字段名沿用原有线上协议（camelCase）。

use serde::{Deserialize, Serialize};

use domain::{ConversationId, DeliveryStatus, MessageId, MessageType, RequestId, UserId};

use crate::views::{ConversationView, FriendRequestView, MessageView, UserView};

/// 客户端入站事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    SendFriendRequest { recipient_id: UserId },
    #[serde(rename_all = "camelCase")]
    AcceptFriendRequest { request_id: RequestId },
    #[serde(rename_all = "camelCase")]
    RejectFriendRequest { request_id: RequestId },
    GetFriendRequests,
    GetFriends,
    #[serde(rename_all = "camelCase")]
    Unfriend { user_id: UserId },
    #[serde(rename_all = "camelCase")]
    SearchUsers { handle: String },

    #[serde(rename_all = "camelCase")]
    SendMessage {
        recipient_id: UserId,
        content: String,
        #[serde(default)]
        message_type: MessageType,
        #[serde(default)]
        expires_in_secs: Option<u32>,
        #[serde(default)]
        media_url: Option<String>,
        #[serde(default)]
        media_duration_secs: Option<u32>,
        #[serde(default)]
        reply_to_message_id: Option<MessageId>,
    },
    #[serde(rename_all = "camelCase")]
    SendPing { recipient_id: UserId },
    #[serde(rename_all = "camelCase")]
    GetMessages {
        conversation_id: ConversationId,
        #[serde(default)]
        limit: Option<u32>,
        #[serde(default)]
        offset: Option<u32>,
    },
    #[serde(rename_all = "camelCase")]
    MessageDelivered { message_id: MessageId },
    #[serde(rename_all = "camelCase")]
    MarkConversationRead { conversation_id: ConversationId },
    #[serde(rename_all = "camelCase")]
    AddReaction { message_id: MessageId, emoji: String },
    #[serde(rename_all = "camelCase")]
    RemoveReaction { message_id: MessageId, emoji: String },
    #[serde(rename_all = "camelCase")]
    HideMessage { message_id: MessageId },
    #[serde(rename_all = "camelCase")]
    DeleteMessage { message_id: MessageId },

    GetConversations,
    #[serde(rename_all = "camelCase")]
    DeleteConversation { conversation_id: ConversationId },
    #[serde(rename_all = "camelCase")]
    SetDisappearingTimer {
        conversation_id: ConversationId,
        /// 0 表示关闭
        seconds: u32,
    },

    #[serde(rename_all = "camelCase")]
    BlockUser { user_id: UserId },
    #[serde(rename_all = "camelCase")]
    UnblockUser { user_id: UserId },
}

/// 服务端出站事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    FriendRequestSent(FriendRequestView),
    NewFriendRequest(FriendRequestView),
    FriendRequestAccepted(FriendRequestView),
    FriendRequestRejected(FriendRequestView),
    FriendRequestsList(Vec<FriendRequestView>),
    #[serde(rename_all = "camelCase")]
    PendingRequestsCount { count: u64 },
    FriendsList(Vec<UserView>),
    #[serde(rename_all = "camelCase")]
    Unfriended { user_id: UserId },
    SearchUsersResult(Vec<UserView>),

    MessageSent(MessageView),
    NewMessage(MessageView),
    PingSent(MessageView),
    NewPing(MessageView),
    MessageHistory(Vec<MessageView>),
    #[serde(rename_all = "camelCase")]
    MessageDelivered {
        message_id: MessageId,
        delivery_status: DeliveryStatus,
    },
    #[serde(rename_all = "camelCase")]
    ConversationRead {
        conversation_id: ConversationId,
        reader_id: UserId,
    },
    ReactionUpdated(MessageView),
    #[serde(rename_all = "camelCase")]
    MessageHidden { message_id: MessageId },
    #[serde(rename_all = "camelCase")]
    MessageDeleted {
        message_id: MessageId,
        conversation_id: ConversationId,
    },

    ConversationsList(Vec<ConversationView>),
    #[serde(rename_all = "camelCase")]
    OpenConversation { conversation_id: ConversationId },
    #[serde(rename_all = "camelCase")]
    ConversationDeleted { conversation_id: ConversationId },
    #[serde(rename_all = "camelCase")]
    DisappearingTimerUpdated {
        conversation_id: ConversationId,
        seconds: u32,
    },

    #[serde(rename_all = "camelCase")]
    Blocked { user_id: UserId },
    #[serde(rename_all = "camelCase")]
    Unblocked { user_id: UserId },

    #[serde(rename_all = "camelCase")]
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn client_event_uses_wire_names() {
        let id = Uuid::new_v4();
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "sendFriendRequest",
            "data": { "recipientId": id }
        }))
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::SendFriendRequest {
                recipient_id: UserId::from(id)
            }
        );
    }

    #[test]
    fn send_message_defaults_optional_fields() {
        let id = Uuid::new_v4();
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "sendMessage",
            "data": { "recipientId": id, "content": "hi", "messageType": "TEXT" }
        }))
        .unwrap();
        match event {
            ClientEvent::SendMessage {
                message_type,
                expires_in_secs,
                reply_to_message_id,
                ..
            } => {
                assert_eq!(message_type, MessageType::Text);
                assert_eq!(expires_in_secs, None);
                assert_eq!(reply_to_message_id, None);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn server_event_serializes_tagged() {
        let event = ServerEvent::PendingRequestsCount { count: 3 };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({ "event": "pendingRequestsCount", "data": { "count": 3 } })
        );
    }
}

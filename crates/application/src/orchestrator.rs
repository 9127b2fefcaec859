//! 事件协调器
//!
//! 把入站事件编排为"先关键变更、后尽力推送"的两段式处理：
//! 关键段失败立即返回错误（由传输层映射为发给调用方的 error
//! 事件），不留半成品；关键段成功后的视图刷新与对侧通知逐个
//! 独立执行，单个失败只记日志，绝不让已提交的变更回滚，也
//! 不影响其余推送。

use std::sync::Arc;

use domain::{
    Conversation, ConversationId, FriendRequest, FriendRequestStatus, Handle, UserId,
    UserRepository,
};

use crate::errors::{ApplicationError, ApplicationResult};
use crate::events::{ClientEvent, ServerEvent};
use crate::presence::{ConnectionId, EventSink, PresenceRegistry};
use crate::services::block_service::BlockService;
use crate::services::conversation_service::ConversationService;
use crate::services::friendship_service::FriendshipService;
use crate::services::message_service::{MessageService, SendMessageCommand};
use crate::views::{FriendRequestView, MessageView, UserView};

/// 事件协调器
pub struct ChatOrchestrator {
    users: Arc<dyn UserRepository>,
    friendship: Arc<FriendshipService>,
    conversations: Arc<ConversationService>,
    messages: Arc<MessageService>,
    blocks: Arc<BlockService>,
    presence: Arc<PresenceRegistry>,
}

impl ChatOrchestrator {
    pub fn new(
        users: Arc<dyn UserRepository>,
        friendship: Arc<FriendshipService>,
        conversations: Arc<ConversationService>,
        messages: Arc<MessageService>,
        blocks: Arc<BlockService>,
        presence: Arc<PresenceRegistry>,
    ) -> Self {
        Self {
            users,
            friendship,
            conversations,
            messages,
            blocks,
            presence,
        }
    }

    /// 连接建立：登记到在线注册表（最后的连接获胜）。
    pub async fn register_connection(
        &self,
        user: UserId,
        sink: Arc<dyn EventSink>,
    ) -> ConnectionId {
        self.presence.set(user, sink).await
    }

    /// 连接断开：只有仍是当前连接时才下线。
    pub async fn unregister_connection(&self, user: UserId, connection: ConnectionId) -> bool {
        self.presence.remove(user, connection).await
    }

    /// 处理入站事件并把失败转成发给调用方的 error 事件。
    pub async fn dispatch(&self, user: UserId, event: ClientEvent) {
        if let Err(err) = self.handle(user, event).await {
            tracing::warn!(user_id = %user, error = %err, "事件处理失败");
            self.push_to(
                user,
                ServerEvent::Error {
                    message: err.to_string(),
                },
            )
            .await;
        }
    }

    /// 处理入站事件。错误只代表关键段失败；尽力推送段的
    /// 失败已在内部吞掉。
    pub async fn handle(&self, user: UserId, event: ClientEvent) -> ApplicationResult<()> {
        match event {
            ClientEvent::SendFriendRequest { recipient_id } => {
                self.on_send_friend_request(user, recipient_id).await
            }
            ClientEvent::AcceptFriendRequest { request_id } => {
                let request = self.friendship.accept_request(request_id, user).await?;
                self.fan_out_acceptance(user, &request).await;
                Ok(())
            }
            ClientEvent::RejectFriendRequest { request_id } => {
                let request = self.friendship.reject_request(request_id, user).await?;
                if let Ok(view) = self.request_view(&request).await {
                    self.push_to(user, ServerEvent::FriendRequestRejected(view)).await;
                }
                self.refresh_pending(user).await;
                Ok(())
            }
            ClientEvent::GetFriendRequests => {
                let views = self.pending_views(user).await?;
                let count = views.len() as u64;
                self.push_to(user, ServerEvent::FriendRequestsList(views)).await;
                self.push_to(user, ServerEvent::PendingRequestsCount { count }).await;
                Ok(())
            }
            ClientEvent::GetFriends => {
                let friends = self.friendship.get_friends(user).await?;
                let views = friends.iter().map(UserView::from).collect();
                self.push_to(user, ServerEvent::FriendsList(views)).await;
                Ok(())
            }
            ClientEvent::Unfriend { user_id } => self.on_unfriend(user, user_id).await,
            ClientEvent::SearchUsers { handle } => self.on_search_users(user, &handle).await,

            ClientEvent::SendMessage {
                recipient_id,
                content,
                message_type,
                expires_in_secs,
                media_url,
                media_duration_secs,
                reply_to_message_id,
            } => {
                let (message, conversation) = self
                    .messages
                    .send(SendMessageCommand {
                        sender_id: user,
                        recipient_id,
                        content,
                        message_type,
                        expires_in_secs,
                        media_url,
                        media_duration_secs,
                        reply_to: reply_to_message_id,
                    })
                    .await?;
                let view = MessageView::from(&message);
                self.push_to(user, ServerEvent::MessageSent(view.clone())).await;
                if let Some(recipient) = conversation.counterpart(user) {
                    self.push_to(recipient, ServerEvent::NewMessage(view)).await;
                }
                Ok(())
            }
            ClientEvent::SendPing { recipient_id } => {
                let (message, conversation) = self.messages.send_ping(user, recipient_id).await?;
                let view = MessageView::from(&message);
                self.push_to(user, ServerEvent::PingSent(view.clone())).await;
                if let Some(recipient) = conversation.counterpart(user) {
                    self.push_to(recipient, ServerEvent::NewPing(view)).await;
                }
                Ok(())
            }
            ClientEvent::GetMessages {
                conversation_id,
                limit,
                offset,
            } => {
                let page = self
                    .messages
                    .history(conversation_id, user, limit, offset)
                    .await?;
                let views = page.iter().map(MessageView::from).collect();
                self.push_to(user, ServerEvent::MessageHistory(views)).await;
                Ok(())
            }
            ClientEvent::MessageDelivered { message_id } => {
                // 消息已不存在（过期、全员删除）时静默忽略
                if let Some(message) = self.messages.mark_delivered(message_id).await? {
                    self.push_to(
                        message.sender_id,
                        ServerEvent::MessageDelivered {
                            message_id,
                            delivery_status: message.delivery_status,
                        },
                    )
                    .await;
                }
                Ok(())
            }
            ClientEvent::MarkConversationRead { conversation_id } => {
                let (updated, counterpart) = self
                    .messages
                    .mark_conversation_read(conversation_id, user)
                    .await?;
                if updated > 0 {
                    self.push_to(
                        counterpart,
                        ServerEvent::ConversationRead {
                            conversation_id,
                            reader_id: user,
                        },
                    )
                    .await;
                }
                Ok(())
            }
            ClientEvent::AddReaction { message_id, emoji } => {
                let (message, conversation) =
                    self.messages.set_reaction(message_id, user, &emoji).await?;
                self.fan_out_reaction(&conversation, &MessageView::from(&message)).await;
                Ok(())
            }
            ClientEvent::RemoveReaction { message_id, emoji } => {
                let (message, conversation) = self
                    .messages
                    .remove_reaction(message_id, user, &emoji)
                    .await?;
                self.fan_out_reaction(&conversation, &MessageView::from(&message)).await;
                Ok(())
            }
            ClientEvent::HideMessage { message_id } => {
                self.messages.hide_for_user(message_id, user).await?;
                self.push_to(user, ServerEvent::MessageHidden { message_id }).await;
                Ok(())
            }
            ClientEvent::DeleteMessage { message_id } => {
                let (message_id, conversation_id) =
                    self.messages.delete_for_everyone(message_id, user).await?;
                self.fan_out_to_participants(
                    conversation_id,
                    ServerEvent::MessageDeleted {
                        message_id,
                        conversation_id,
                    },
                )
                .await;
                Ok(())
            }

            ClientEvent::GetConversations => {
                let views = self.conversations.views_for_user(user).await?;
                self.push_to(user, ServerEvent::ConversationsList(views)).await;
                Ok(())
            }
            ClientEvent::DeleteConversation { conversation_id } => {
                let conversation = self.conversations.delete(conversation_id, user).await?;
                for participant in [conversation.pair.lower(), conversation.pair.upper()] {
                    self.push_to(
                        participant,
                        ServerEvent::ConversationDeleted { conversation_id },
                    )
                    .await;
                    self.refresh_conversations_list(participant).await;
                }
                Ok(())
            }
            ClientEvent::SetDisappearingTimer {
                conversation_id,
                seconds,
            } => {
                // 0 表示关闭
                let timer = (seconds > 0).then_some(seconds);
                let conversation = self
                    .conversations
                    .set_disappearing_timer(conversation_id, user, timer)
                    .await?;
                for participant in [conversation.pair.lower(), conversation.pair.upper()] {
                    self.push_to(
                        participant,
                        ServerEvent::DisappearingTimerUpdated {
                            conversation_id,
                            seconds,
                        },
                    )
                    .await;
                }
                Ok(())
            }

            ClientEvent::BlockUser { user_id } => self.on_block_user(user, user_id).await,
            ClientEvent::UnblockUser { user_id } => {
                self.blocks.unblock(user, user_id).await?;
                self.push_to(user, ServerEvent::Unblocked { user_id }).await;
                Ok(())
            }
        }
    }

    async fn on_send_friend_request(
        &self,
        sender: UserId,
        recipient: UserId,
    ) -> ApplicationResult<()> {
        let request = self.friendship.send_request(sender, recipient).await?;
        match request.status {
            FriendRequestStatus::Pending => {
                if let Ok(view) = self.request_view(&request).await {
                    self.push_to(sender, ServerEvent::FriendRequestSent(view.clone())).await;
                    self.push_to(recipient, ServerEvent::NewFriendRequest(view)).await;
                }
                self.refresh_pending_count(recipient).await;
            }
            // 交叉请求已自动握手为好友
            FriendRequestStatus::Accepted => {
                self.fan_out_acceptance(sender, &request).await;
            }
            FriendRequestStatus::Rejected => {}
        }
        Ok(())
    }

    async fn on_unfriend(&self, caller: UserId, other: UserId) -> ApplicationResult<()> {
        // 幂等：没有好友记录也继续清理会话并广播，终态一致
        let removed = self.friendship.unfriend(caller, other).await?;
        if !removed {
            tracing::debug!(user_a = %caller, user_b = %other, "解除好友时没有好友记录");
        }
        // 会话清理是非关键步骤：好友关系已经解除，清理失败只记日志
        match self.conversations.teardown_between(caller, other).await {
            Ok(Some(conversation_id)) => {
                tracing::debug!(conversation_id = %conversation_id, "解除好友时清理会话");
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(user_a = %caller, user_b = %other, error = %err, "会话清理失败");
            }
        }
        self.push_to(caller, ServerEvent::Unfriended { user_id: other }).await;
        self.push_to(other, ServerEvent::Unfriended { user_id: caller }).await;
        for participant in [caller, other] {
            self.refresh_friends_list(participant).await;
            self.refresh_conversations_list(participant).await;
        }
        Ok(())
    }

    async fn on_search_users(&self, caller: UserId, raw_handle: &str) -> ApplicationResult<()> {
        let handle = Handle::parse(raw_handle)?;
        let mut results = Vec::new();
        if let Some(found) = self.users.find_by_handle(&handle).await? {
            let visible = found.id != caller
                && !self.friendship.are_friends(caller, found.id).await?
                && !self.blocks.is_blocked_by_either(caller, found.id).await?;
            if visible {
                results.push(UserView::from(&found));
            }
        }
        self.push_to(caller, ServerEvent::SearchUsersResult(results)).await;
        Ok(())
    }

    async fn on_block_user(&self, blocker: UserId, blocked: UserId) -> ApplicationResult<()> {
        self.blocks.block(blocker, blocked).await?;
        // 拉黑后的会话清理同样是非关键步骤
        if let Err(err) = self.conversations.teardown_between(blocker, blocked).await {
            tracing::warn!(blocker_id = %blocker, blocked_id = %blocked, error = %err, "会话清理失败");
        }
        self.push_to(blocker, ServerEvent::Blocked { user_id: blocked }).await;
        for participant in [blocker, blocked] {
            self.refresh_friends_list(participant).await;
            self.refresh_conversations_list(participant).await;
        }
        Ok(())
    }

    /// 好友关系成立后的共用扇出：双方的接受通知、好友列表、
    /// 会话创建与打开。`caller` 是触发本次扇出的一方。
    async fn fan_out_acceptance(&self, caller: UserId, request: &FriendRequest) {
        let sender = request.sender_id;
        let receiver = request.receiver_id;

        if let Ok(view) = self.request_view(request).await {
            self.push_to(sender, ServerEvent::FriendRequestAccepted(view.clone())).await;
            self.push_to(receiver, ServerEvent::FriendRequestAccepted(view)).await;
        }

        let conversation = match self.conversations.find_or_create(sender, receiver).await {
            Ok(conversation) => Some(conversation),
            Err(err) => {
                tracing::warn!(sender_id = %sender, receiver_id = %receiver, error = %err, "会话创建失败");
                None
            }
        };

        for participant in [sender, receiver] {
            self.refresh_friends_list(participant).await;
            self.refresh_conversations_list(participant).await;
            if let Some(conversation) = &conversation {
                self.push_to(
                    participant,
                    ServerEvent::OpenConversation {
                        conversation_id: conversation.id,
                    },
                )
                .await;
            }
        }
        self.refresh_pending(caller).await;
        if let Some(other) = request.counterpart(caller) {
            self.refresh_pending_count(other).await;
        }
    }

    async fn fan_out_reaction(&self, conversation: &Conversation, view: &MessageView) {
        for participant in [conversation.pair.lower(), conversation.pair.upper()] {
            self.push_to(participant, ServerEvent::ReactionUpdated(view.clone())).await;
        }
    }

    async fn fan_out_to_participants(&self, conversation_id: ConversationId, event: ServerEvent) {
        match self.conversations.get(conversation_id).await {
            Ok(conversation) => {
                for participant in [conversation.pair.lower(), conversation.pair.upper()] {
                    self.push_to(participant, event.clone()).await;
                }
            }
            Err(err) => {
                tracing::warn!(conversation_id = %conversation_id, error = %err, "会话参与者解析失败");
            }
        }
    }

    /// 尽力推送：不在线静默丢弃，投递失败记日志。
    async fn push_to(&self, user: UserId, event: ServerEvent) {
        let Some(sink) = self.presence.get(user).await else {
            tracing::trace!(user_id = %user, "目标不在线，丢弃推送");
            return;
        };
        if let Err(err) = sink.deliver(event) {
            tracing::warn!(user_id = %user, error = %err, "推送失败");
        }
    }

    async fn refresh_friends_list(&self, user: UserId) {
        match self.friendship.get_friends(user).await {
            Ok(friends) => {
                let views = friends.iter().map(UserView::from).collect();
                self.push_to(user, ServerEvent::FriendsList(views)).await;
            }
            Err(err) => {
                tracing::warn!(user_id = %user, error = %err, "好友列表刷新失败");
            }
        }
    }

    async fn refresh_conversations_list(&self, user: UserId) {
        match self.conversations.views_for_user(user).await {
            Ok(views) => {
                self.push_to(user, ServerEvent::ConversationsList(views)).await;
            }
            Err(err) => {
                tracing::warn!(user_id = %user, error = %err, "会话列表刷新失败");
            }
        }
    }

    /// 刷新待处理列表与计数。
    async fn refresh_pending(&self, user: UserId) {
        match self.pending_views(user).await {
            Ok(views) => {
                let count = views.len() as u64;
                self.push_to(user, ServerEvent::FriendRequestsList(views)).await;
                self.push_to(user, ServerEvent::PendingRequestsCount { count }).await;
            }
            Err(err) => {
                tracing::warn!(user_id = %user, error = %err, "待处理请求刷新失败");
            }
        }
    }

    async fn refresh_pending_count(&self, user: UserId) {
        match self.friendship.pending_count(user).await {
            Ok(count) => {
                self.push_to(user, ServerEvent::PendingRequestsCount { count }).await;
            }
            Err(err) => {
                tracing::warn!(user_id = %user, error = %err, "待处理计数刷新失败");
            }
        }
    }

    async fn pending_views(&self, user: UserId) -> ApplicationResult<Vec<FriendRequestView>> {
        let pending = self.friendship.pending_requests(user).await?;
        let mut views = Vec::with_capacity(pending.len());
        for request in &pending {
            // 参与者已被身份子系统移除的请求直接跳过
            if let Ok(view) = self.request_view(request).await {
                views.push(view);
            }
        }
        Ok(views)
    }

    async fn request_view(&self, request: &FriendRequest) -> ApplicationResult<FriendRequestView> {
        let sender = self.require_user(request.sender_id).await?;
        let receiver = self.require_user(request.receiver_id).await?;
        Ok(FriendRequestView::new(request, &sender, &receiver))
    }

    async fn require_user(&self, id: UserId) -> ApplicationResult<domain::User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("User not found"))
    }
}

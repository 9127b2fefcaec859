//! 消息Repository接口定义

use async_trait::async_trait;

use crate::delivery::DeliveryStatus;
use crate::entities::message::Message;
use crate::errors::RepositoryResult;
use crate::value_objects::{ConversationId, MessageId, Timestamp, UserId};

/// 消息Repository接口
///
/// 可见性过滤（过期 + 单侧隐藏）在分页窗口之前应用，
/// 判定本身复用 `Message::is_visible_to` 这个纯函数。
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// 创建新消息
    async fn create(&self, message: Message) -> RepositoryResult<Message>;

    /// 根据ID查找消息
    async fn find_by_id(&self, id: MessageId) -> RepositoryResult<Option<Message>>;

    /// 整行更新（隐藏集合、表情回应等写回）
    async fn update(&self, message: Message) -> RepositoryResult<Message>;

    /// 会话内对 `viewer` 可见的消息窗口：取最新的一页，
    /// 以最旧在前的顺序返回。
    async fn list_visible(
        &self,
        conversation: ConversationId,
        viewer: UserId,
        now: Timestamp,
        limit: u32,
        offset: u32,
    ) -> RepositoryResult<Vec<Message>>;

    /// 会话内对 `viewer` 可见的最新一条消息
    async fn last_visible(
        &self,
        conversation: ConversationId,
        viewer: UserId,
        now: Timestamp,
    ) -> RepositoryResult<Option<Message>>;

    /// 对侧发给 `viewer`、尚未 READ 且在 `now` 时刻仍可见的消息数量。
    /// 过期或已对 `viewer` 隐藏的消息不计入未读。
    async fn count_unread_for(
        &self,
        conversation: ConversationId,
        viewer: UserId,
        now: Timestamp,
    ) -> RepositoryResult<u64>;

    /// 单调推进投递状态；消息不存在时返回 `None`。
    /// 低于等于当前状态的更新是空操作，返回未变的消息。
    async fn update_status(
        &self,
        id: MessageId,
        status: DeliveryStatus,
    ) -> RepositoryResult<Option<Message>>;

    /// 把会话内 `sender` 发出的全部非 READ 消息一次性置为 READ。
    /// 单个批量操作：不存在部分行已读、部分行未读的中间窗口。
    /// 返回受影响的行数。
    async fn mark_read_from_sender(
        &self,
        conversation: ConversationId,
        sender: UserId,
    ) -> RepositoryResult<u64>;

    /// 硬删除单条消息
    async fn delete(&self, id: MessageId) -> RepositoryResult<()>;

    /// 删除会话内全部消息，返回删除数量
    async fn delete_by_conversation(&self, conversation: ConversationId) -> RepositoryResult<u64>;
}

//! 会话Repository接口定义

use async_trait::async_trait;

use crate::entities::conversation::Conversation;
use crate::errors::RepositoryResult;
use crate::value_objects::{ConversationId, Timestamp, UserId, UserPair};

/// 会话Repository接口
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// 按无序对查找，未命中则创建。返回会话和是否新建。
    ///
    /// 依赖规范化用户对上的唯一约束：同一对用户的并发调用
    /// 必须收敛到同一条记录，绝不产生重复行。
    async fn find_or_create(
        &self,
        pair: UserPair,
        now: Timestamp,
    ) -> RepositoryResult<(Conversation, bool)>;

    /// 根据ID查找会话
    async fn find_by_id(&self, id: ConversationId) -> RepositoryResult<Option<Conversation>>;

    /// 指定用户参与的全部会话
    async fn list_by_user(&self, user: UserId) -> RepositoryResult<Vec<Conversation>>;

    /// 按无序对查找会话
    async fn find_by_pair(&self, pair: UserPair) -> RepositoryResult<Option<Conversation>>;

    /// 更新阅后即焚定时器；`None` 表示关闭
    async fn set_disappearing_timer(
        &self,
        id: ConversationId,
        seconds: Option<u32>,
    ) -> RepositoryResult<Conversation>;

    /// 删除会话行（消息级联由调用方先行处理）
    async fn delete(&self, id: ConversationId) -> RepositoryResult<()>;
}

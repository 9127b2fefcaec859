//! 拉黑关系Repository接口定义

use async_trait::async_trait;

use crate::entities::blocked_pair::BlockedPair;
use crate::errors::RepositoryResult;
use crate::value_objects::UserId;

/// 拉黑关系Repository接口
#[async_trait]
pub trait BlockedPairRepository: Send + Sync {
    /// 幂等插入：已存在时返回现有记录
    async fn insert(&self, pair: BlockedPair) -> RepositoryResult<BlockedPair>;

    /// 删除拉黑记录；存在并删除时返回 true
    async fn remove(&self, blocker: UserId, blocked: UserId) -> RepositoryResult<bool>;

    /// blocker 是否拉黑了 blocked（单方向）
    async fn is_blocked(&self, blocker: UserId, blocked: UserId) -> RepositoryResult<bool>;

    /// 指定用户拉黑的所有用户
    async fn list_blocked_by(&self, blocker: UserId) -> RepositoryResult<Vec<UserId>>;

    /// 拉黑了指定用户的所有用户
    async fn list_blockers_of(&self, blocked: UserId) -> RepositoryResult<Vec<UserId>>;
}

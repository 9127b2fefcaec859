//! 好友请求Repository接口定义

use async_trait::async_trait;

use crate::entities::friend_request::FriendRequest;
use crate::errors::RepositoryResult;
use crate::value_objects::{RequestId, Timestamp, UserId, UserPair};

/// `create_pending` 的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingInsert {
    /// 正常创建了一条 PENDING 记录
    Created(FriendRequest),
    /// 反向已有 PENDING（交叉请求）：新记录与反向记录
    /// 已被一并翻转为 ACCEPTED
    AutoAccepted {
        /// 新创建的记录（已是 ACCEPTED）
        request: FriendRequest,
        /// 先前存在的反向记录（已是 ACCEPTED）
        reverse: FriendRequest,
    },
}

/// 好友请求Repository接口
#[async_trait]
pub trait FriendRequestRepository: Send + Sync {
    /// 根据ID查找请求
    async fn find_by_id(&self, id: RequestId) -> RepositoryResult<Option<FriendRequest>>;

    /// 整行更新（接受/拒绝后写回）
    async fn update(&self, request: FriendRequest) -> RepositoryResult<FriendRequest>;

    /// 竞态关键的复合操作：在单一隔离范围内检查并创建 PENDING 记录。
    ///
    /// - 同方向已有 PENDING：返回 `RepositoryError::Conflict`，
    ///   对应存储层 (sender, receiver, PENDING) 上的唯一约束；
    /// - 反方向已有 PENDING（交叉请求）：创建新记录并把两条记录
    ///   原子地翻转为 ACCEPTED，按 `RequestId` 升序写入（较小 id
    ///   为主记录），两个并发的反向调用只会得到一段好友关系；
    /// - 否则：创建并返回 PENDING 记录。
    async fn create_pending(
        &self,
        sender: UserId,
        receiver: UserId,
        now: Timestamp,
    ) -> RepositoryResult<PendingInsert>;

    /// 查找该无序对上的 ACCEPTED 记录（任一方向）
    async fn find_accepted_between(&self, pair: UserPair)
        -> RepositoryResult<Option<FriendRequest>>;

    /// 触及指定用户的全部 ACCEPTED 记录
    async fn list_accepted_touching(&self, user: UserId) -> RepositoryResult<Vec<FriendRequest>>;

    /// 指定接收者的 PENDING 请求，按创建时间倒序
    async fn list_pending_for_receiver(&self, user: UserId)
        -> RepositoryResult<Vec<FriendRequest>>;

    /// 指定接收者的 PENDING 请求数量
    async fn count_pending_for_receiver(&self, user: UserId) -> RepositoryResult<u64>;

    /// 删除该无序对上的 ACCEPTED 记录；存在并删除时返回 true
    async fn delete_accepted_between(&self, pair: UserPair) -> RepositoryResult<bool>;
}

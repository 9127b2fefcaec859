//! 好友关系状态机
//!
//! 状态迁移：(none)→PENDING→{ACCEPTED, REJECTED}；ACCEPTED→(删除)。
//! 交叉请求（双方互发 PENDING）自动握手为 ACCEPTED。
//! 拒绝后没有冷却期：只有同方向仍存活的 PENDING 会冲突，
//! 被拒绝后可以立即重新发起。

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use domain::{
    BlockedPairRepository, FriendRequest, FriendRequestRepository, FriendRequestStatus,
    PendingInsert, RepositoryError, RequestId, User, UserId, UserPair, UserRepository,
};

use crate::errors::{ApplicationError, ApplicationResult};

/// 好友关系服务
pub struct FriendshipService {
    requests: Arc<dyn FriendRequestRepository>,
    blocks: Arc<dyn BlockedPairRepository>,
    users: Arc<dyn UserRepository>,
}

impl FriendshipService {
    pub fn new(
        requests: Arc<dyn FriendRequestRepository>,
        blocks: Arc<dyn BlockedPairRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            requests,
            blocks,
            users,
        }
    }

    /// 发起好友请求。
    ///
    /// 反方向已有 PENDING 时触发相互握手：两条记录被原子地翻转为
    /// ACCEPTED，返回的新记录已处于 ACCEPTED 状态。
    pub async fn send_request(
        &self,
        sender: UserId,
        receiver: UserId,
    ) -> ApplicationResult<FriendRequest> {
        if sender == receiver {
            return Err(ApplicationError::conflict(
                "Cannot send friend request to yourself",
            ));
        }
        if self.blocked_either_way(sender, receiver).await? {
            return Err(ApplicationError::unauthorized("User is not available"));
        }

        let pair = UserPair::new(sender, receiver)?;
        if self.requests.find_accepted_between(pair).await?.is_some() {
            return Err(ApplicationError::conflict("Already friends"));
        }

        match self.requests.create_pending(sender, receiver, Utc::now()).await {
            Ok(PendingInsert::Created(request)) => {
                tracing::debug!(
                    request_id = %request.id,
                    sender_id = %sender,
                    receiver_id = %receiver,
                    "好友请求已创建"
                );
                Ok(request)
            }
            Ok(PendingInsert::AutoAccepted { request, reverse }) => {
                tracing::info!(
                    request_id = %request.id,
                    reverse_id = %reverse.id,
                    "交叉好友请求，自动接受"
                );
                Ok(request)
            }
            Err(RepositoryError::Conflict { .. }) => {
                Err(ApplicationError::conflict("Friend request already sent"))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// 接受请求。只有接收方可以接受；重复接受幂等。
    pub async fn accept_request(
        &self,
        request_id: RequestId,
        caller: UserId,
    ) -> ApplicationResult<FriendRequest> {
        let mut request = self.require_request(request_id).await?;
        if request.receiver_id != caller {
            return Err(ApplicationError::conflict(
                "Only receiver can accept this request",
            ));
        }
        match request.status {
            FriendRequestStatus::Pending => {
                request.respond(FriendRequestStatus::Accepted, Utc::now());
                Ok(self.requests.update(request).await?)
            }
            // 交叉握手可能已经把它翻转成 ACCEPTED
            FriendRequestStatus::Accepted => Ok(request),
            FriendRequestStatus::Rejected => {
                Err(ApplicationError::conflict("Friend request already rejected"))
            }
        }
    }

    /// 拒绝请求。只有接收方可以拒绝；重复拒绝幂等。
    pub async fn reject_request(
        &self,
        request_id: RequestId,
        caller: UserId,
    ) -> ApplicationResult<FriendRequest> {
        let mut request = self.require_request(request_id).await?;
        if request.receiver_id != caller {
            return Err(ApplicationError::conflict(
                "Only receiver can reject this request",
            ));
        }
        match request.status {
            FriendRequestStatus::Pending => {
                request.respond(FriendRequestStatus::Rejected, Utc::now());
                Ok(self.requests.update(request).await?)
            }
            FriendRequestStatus::Rejected => Ok(request),
            FriendRequestStatus::Accepted => {
                Err(ApplicationError::conflict("Friend request already accepted"))
            }
        }
    }

    /// 解除好友：整条 ACCEPTED 记录被删除，之后重新发起请求
    /// 从干净状态开始。幂等，不存在时返回 false。
    pub async fn unfriend(&self, a: UserId, b: UserId) -> ApplicationResult<bool> {
        if a == b {
            return Ok(false);
        }
        let pair = UserPair::new(a, b)?;
        let removed = self.requests.delete_accepted_between(pair).await?;
        if removed {
            tracing::debug!(user_a = %a, user_b = %b, "好友关系已解除");
        }
        Ok(removed)
    }

    pub async fn are_friends(&self, a: UserId, b: UserId) -> ApplicationResult<bool> {
        if a == b {
            return Ok(false);
        }
        let pair = UserPair::new(a, b)?;
        Ok(self.requests.find_accepted_between(pair).await?.is_some())
    }

    /// 派生的好友列表：触及该用户的 ACCEPTED 记录解析为对侧用户。
    pub async fn get_friends(&self, user: UserId) -> ApplicationResult<Vec<User>> {
        let accepted = self.requests.list_accepted_touching(user).await?;
        let mut seen = HashSet::new();
        let mut friends = Vec::new();
        for record in &accepted {
            let Some(counterpart) = record.counterpart(user) else {
                continue;
            };
            if !seen.insert(counterpart) {
                continue;
            }
            if let Some(friend) = self.users.find_by_id(counterpart).await? {
                friends.push(friend);
            }
        }
        Ok(friends)
    }

    pub async fn pending_requests(&self, user: UserId) -> ApplicationResult<Vec<FriendRequest>> {
        Ok(self.requests.list_pending_for_receiver(user).await?)
    }

    pub async fn pending_count(&self, user: UserId) -> ApplicationResult<u64> {
        Ok(self.requests.count_pending_for_receiver(user).await?)
    }

    async fn require_request(&self, id: RequestId) -> ApplicationResult<FriendRequest> {
        self.requests
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Friend request not found"))
    }

    async fn blocked_either_way(&self, a: UserId, b: UserId) -> ApplicationResult<bool> {
        if self.blocks.is_blocked(a, b).await? {
            return Ok(true);
        }
        Ok(self.blocks.is_blocked(b, a).await?)
    }
}

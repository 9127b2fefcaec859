//! 好友请求实体
//!
//! 记录是有向的；对称的好友关系是派生概念：任意方向上存在
//! 一条 ACCEPTED 记录即视为好友。解除好友时整条记录被删除
//! 而不是软关闭，之后重新发起请求从干净状态开始。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::{RequestId, Timestamp, UserId};

/// 好友请求状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FriendRequestStatus {
    /// 待处理
    Pending,
    /// 已接受
    Accepted,
    /// 已拒绝
    Rejected,
}

/// 好友请求实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequest {
    /// 请求唯一ID
    pub id: RequestId,
    /// 发起方
    pub sender_id: UserId,
    /// 接收方
    pub receiver_id: UserId,
    /// 当前状态
    pub status: FriendRequestStatus,
    /// 创建时间
    pub created_at: Timestamp,
    /// 响应时间（接受或拒绝时写入）
    pub responded_at: Option<Timestamp>,
}

impl FriendRequest {
    pub fn new_pending(sender_id: UserId, receiver_id: UserId, now: Timestamp) -> Self {
        Self {
            id: RequestId::from(Uuid::new_v4()),
            sender_id,
            receiver_id,
            status: FriendRequestStatus::Pending,
            created_at: now,
            responded_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == FriendRequestStatus::Pending
    }

    pub fn is_accepted(&self) -> bool {
        self.status == FriendRequestStatus::Accepted
    }

    /// 写入接受/拒绝结果并记录响应时间。
    pub fn respond(&mut self, status: FriendRequestStatus, at: Timestamp) {
        self.status = status;
        self.responded_at = Some(at);
    }

    /// 记录是否触及指定用户（任一方向）。
    pub fn touches(&self, user: UserId) -> bool {
        self.sender_id == user || self.receiver_id == user
    }

    /// 相对于指定用户的对侧参与者。
    pub fn counterpart(&self, user: UserId) -> Option<UserId> {
        if self.sender_id == user {
            Some(self.receiver_id)
        } else if self.receiver_id == user {
            Some(self.sender_id)
        } else {
            None
        }
    }
}

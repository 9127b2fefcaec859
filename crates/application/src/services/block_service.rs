//! 拉黑服务与授权否决
//!
//! 拉黑优先于好友关系：任一方向存在拉黑记录即禁止发消息、
//! 发好友请求和搜索可见。拉黑时无条件执行解除好友；
//! 解除拉黑只删记录，不恢复之前的好友关系。

use std::sync::Arc;

use chrono::Utc;

use domain::{BlockedPair, BlockedPairRepository, UserId};

use crate::errors::{ApplicationError, ApplicationResult};
use crate::services::friendship_service::FriendshipService;

/// 拉黑服务
pub struct BlockService {
    blocks: Arc<dyn BlockedPairRepository>,
    friendship: Arc<FriendshipService>,
}

impl BlockService {
    pub fn new(blocks: Arc<dyn BlockedPairRepository>, friendship: Arc<FriendshipService>) -> Self {
        Self { blocks, friendship }
    }

    /// 拉黑用户。幂等插入，随后无条件解除好友（不管当前是否为好友）。
    pub async fn block(&self, blocker: UserId, blocked: UserId) -> ApplicationResult<BlockedPair> {
        if blocker == blocked {
            return Err(ApplicationError::conflict("Cannot block yourself"));
        }
        let record = self
            .blocks
            .insert(BlockedPair::new(blocker, blocked, Utc::now()))
            .await?;
        self.friendship.unfriend(blocker, blocked).await?;
        tracing::debug!(blocker_id = %blocker, blocked_id = %blocked, "用户已被拉黑");
        Ok(record)
    }

    /// 解除拉黑；只删除拉黑记录本身。
    pub async fn unblock(&self, blocker: UserId, blocked: UserId) -> ApplicationResult<bool> {
        let removed = self.blocks.remove(blocker, blocked).await?;
        if removed {
            tracing::debug!(blocker_id = %blocker, blocked_id = %blocked, "已解除拉黑");
        }
        Ok(removed)
    }

    /// 任一方向被拉黑即为真。所有消息发送、好友请求创建和
    /// 搜索可见性之前都要过这道闸。
    pub async fn is_blocked_by_either(&self, a: UserId, b: UserId) -> ApplicationResult<bool> {
        if self.blocks.is_blocked(a, b).await? {
            return Ok(true);
        }
        Ok(self.blocks.is_blocked(b, a).await?)
    }

    /// 指定用户拉黑的用户列表
    pub async fn blocked_users(&self, blocker: UserId) -> ApplicationResult<Vec<UserId>> {
        Ok(self.blocks.list_blocked_by(blocker).await?)
    }
}

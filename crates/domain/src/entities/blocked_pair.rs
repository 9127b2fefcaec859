//! 拉黑关系实体
//!
//! 有向记录：blocker 拉黑了 blocked。存在任一方向的记录即
//! 禁止双方互发消息与互相可见，优先级高于任何 ACCEPTED 好友关系。

use serde::{Deserialize, Serialize};

use crate::value_objects::{Timestamp, UserId};

/// 拉黑关系
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedPair {
    pub blocker_id: UserId,
    pub blocked_id: UserId,
    pub created_at: Timestamp,
}

impl BlockedPair {
    pub fn new(blocker_id: UserId, blocked_id: UserId, now: Timestamp) -> Self {
        Self {
            blocker_id,
            blocked_id,
            created_at: now,
        }
    }
}

//! 会话实体
//!
//! 每个无序用户对最多存在一个会话。会话在首条消息或好友
//! 接受时惰性创建，任一方删除或解除好友时整体删除。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::{ConversationId, Timestamp, UserId, UserPair};

/// 会话实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// 会话唯一ID
    pub id: ConversationId,
    /// 参与者（规范化的无序对）
    pub pair: UserPair,
    /// 阅后即焚定时器（秒）；`None` 表示关闭
    pub disappearing_timer_secs: Option<u32>,
    /// 创建时间
    pub created_at: Timestamp,
}

impl Conversation {
    pub fn new(pair: UserPair, now: Timestamp) -> Self {
        Self {
            id: ConversationId::from(Uuid::new_v4()),
            pair,
            disappearing_timer_secs: None,
            created_at: now,
        }
    }

    pub fn involves(&self, user: UserId) -> bool {
        self.pair.contains(user)
    }

    /// 相对于指定参与者的对侧用户。
    pub fn counterpart(&self, user: UserId) -> Option<UserId> {
        self.pair.other(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn counterpart_follows_pair() {
        let a = UserId::from(Uuid::new_v4());
        let b = UserId::from(Uuid::new_v4());
        let conversation = Conversation::new(UserPair::new(a, b).unwrap(), Utc::now());

        assert!(conversation.involves(a));
        assert!(conversation.involves(b));
        assert_eq!(conversation.counterpart(a), Some(b));
        assert_eq!(conversation.counterpart(UserId::from(Uuid::new_v4())), None);
    }
}

//! 消息投递状态机
//!
//! 投递状态构成全序 SENDING < SENT < DELIVERED < READ，
//! 状态只会单调推进。比较逻辑是纯函数，不依赖存储引擎，
//! 迟到或乱序的回执应用后不会回退已有状态。

use serde::{Deserialize, Serialize};

/// 消息投递状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    /// 发送中（需要回执往返的传输层使用）
    Sending,
    /// 已发送
    Sent,
    /// 已送达
    Delivered,
    /// 已读
    Read,
}

impl Default for DeliveryStatus {
    fn default() -> Self {
        Self::Sent
    }
}

impl DeliveryStatus {
    /// 全序表。状态比较只依赖这里的序值。
    pub fn rank(self) -> u8 {
        match self {
            Self::Sending => 0,
            Self::Sent => 1,
            Self::Delivered => 2,
            Self::Read => 3,
        }
    }

    /// 单调推进：仅当 `next` 严格大于当前状态时返回新状态。
    ///
    /// 迟到的 DELIVERED 回执不会把已 READ 的消息拉回去。
    pub fn advance(self, next: DeliveryStatus) -> Option<DeliveryStatus> {
        (next.rank() > self.rank()).then_some(next)
    }
}

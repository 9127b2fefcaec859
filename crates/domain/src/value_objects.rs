use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

/// 统一的时间戳类型。
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// 用户唯一标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for UserId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<UserId> for Uuid {
    fn from(value: UserId) -> Self {
        value.0
    }
}

/// 会话唯一标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub Uuid);

impl ConversationId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ConversationId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<ConversationId> for Uuid {
    fn from(value: ConversationId) -> Self {
        value.0
    }
}

/// 消息唯一标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for MessageId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<MessageId> for Uuid {
    fn from(value: MessageId) -> Self {
        value.0
    }
}

/// 好友请求唯一标识。
///
/// 实现了全序（按底层 UUID 字节序），交叉请求互相接受时
/// 用较小的 id 作为主记录，保证写入顺序确定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<RequestId> for Uuid {
    fn from(value: RequestId) -> Self {
        value.0
    }
}

/// 经过验证的用户句柄：用户名加数字判别标签，如 `alice#1042`。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle {
    username: String,
    tag: String,
}

impl Handle {
    pub fn parse(value: impl AsRef<str>) -> Result<Self, DomainError> {
        let value = value.as_ref().trim();
        let (username, tag) = value
            .split_once('#')
            .ok_or_else(|| DomainError::validation("handle", "must be username#tag"))?;
        if username.is_empty() {
            return Err(DomainError::validation("handle", "username cannot be empty"));
        }
        if username.len() > 32 {
            return Err(DomainError::validation("handle", "username too long"));
        }
        if tag.len() != 4 || !tag.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::validation("handle", "tag must be 4 digits"));
        }
        Ok(Self {
            username: username.to_owned(),
            tag: tag.to_owned(),
        })
    }

    pub fn from_parts(username: impl Into<String>, tag: impl Into<String>) -> Result<Self, DomainError> {
        let username = username.into();
        let tag = tag.into();
        Self::parse(format!("{username}#{tag}"))
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.username, self.tag)
    }
}

/// 无序用户对的规范形式。
///
/// 构造时将两个 id 排序，保证 (a, b) 与 (b, a) 得到同一个值，
/// 会话去重和好友关系查找都以它为键。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserPair {
    lower: UserId,
    upper: UserId,
}

impl UserPair {
    pub fn new(a: UserId, b: UserId) -> Result<Self, DomainError> {
        if a == b {
            return Err(DomainError::validation(
                "user_pair",
                "both sides refer to the same user",
            ));
        }
        let (lower, upper) = if a <= b { (a, b) } else { (b, a) };
        Ok(Self { lower, upper })
    }

    pub fn lower(&self) -> UserId {
        self.lower
    }

    pub fn upper(&self) -> UserId {
        self.upper
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.lower == user || self.upper == user
    }

    /// 返回对侧用户；`user` 不在对中时返回 `None`。
    pub fn other(&self, user: UserId) -> Option<UserId> {
        if user == self.lower {
            Some(self.upper)
        } else if user == self.upper {
            Some(self.lower)
        } else {
            None
        }
    }
}

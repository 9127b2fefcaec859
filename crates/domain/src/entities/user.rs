//! 用户实体
//!
//! 本核心只关心身份：id 与句柄。账号的创建、凭据与生命周期
//! 由外部身份子系统管理。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainResult;
use crate::value_objects::{Handle, Timestamp, UserId};

/// 用户实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// 用户唯一ID
    pub id: UserId,
    /// 用户名
    pub username: String,
    /// 判别标签（句柄的数字后缀）
    pub tag: String,
    /// 创建时间
    pub created_at: Timestamp,
}

impl User {
    pub fn new(username: impl Into<String>, tag: impl Into<String>, now: Timestamp) -> DomainResult<Self> {
        let username = username.into();
        let tag = tag.into();
        // 复用 Handle 的校验规则
        Handle::from_parts(username.clone(), tag.clone())?;

        Ok(Self {
            id: UserId::from(Uuid::new_v4()),
            username,
            tag,
            created_at: now,
        })
    }

    /// 用户的完整句柄，如 `alice#1042`。
    pub fn handle(&self) -> String {
        format!("{}#{}", self.username, self.tag)
    }
}

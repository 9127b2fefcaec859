//! 应用层错误定义
//!
//! 错误分类对应协议语义：Validation / Conflict / NotFound /
//! Unauthorized，领域与仓储错误原样透传。

use domain::{DomainError, RepositoryError};
use thiserror::Error;

/// 应用层错误类型
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 领域层错误
    #[error("领域错误: {0}")]
    Domain(#[from] DomainError),

    /// 仓储层错误
    #[error("仓储错误: {0}")]
    Repository(#[from] RepositoryError),

    /// 输入验证失败
    #[error("{0}")]
    Validation(String),

    /// 状态冲突（自我操作、重复请求、错误的执行者等）
    #[error("{0}")]
    Conflict(String),

    /// 资源不存在
    #[error("{0}")]
    NotFound(String),

    /// 无权执行（非参与者或已被拉黑）
    #[error("{0}")]
    Unauthorized(String),
}

impl ApplicationError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }
}

/// 应用层结果类型
pub type ApplicationResult<T> = Result<T, ApplicationError>;

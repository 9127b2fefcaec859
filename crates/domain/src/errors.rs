//! 领域模型错误定义
//!
//! 定义实体和仓储边界可能产生的错误类型。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 验证错误
    #[error("验证失败: {field}: {message}")]
    Validation { field: String, message: String },
}

impl DomainError {
    /// 创建验证错误
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;

/// 仓储边界错误类型
///
/// 存储协作方负责唯一性约束和事务隔离，`Conflict` 对应唯一键冲突。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    /// 存储层错误
    #[error("存储错误: {message}")]
    Storage { message: String },

    /// 唯一性约束冲突
    #[error("唯一性冲突: {message}")]
    Conflict { message: String },

    /// 目标记录不存在
    #[error("记录不存在: {message}")]
    NotFound { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }
}

/// 仓储结果类型
pub type RepositoryResult<T> = Result<T, RepositoryError>;

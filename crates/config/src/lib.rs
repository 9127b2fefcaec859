//! 统一配置中心
//!
//! 提供聊天核心的全局配置管理，包括：
//! - 历史消息分页
//! - 消息内容限制

use serde::{Deserialize, Serialize};
use std::env;

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 历史消息分页配置
    pub history: HistoryConfig,
    /// 消息限制配置
    pub message: MessageConfig,
}

/// 历史消息分页配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// 未指定 limit 时的默认页大小
    pub default_limit: u32,
    /// 单次请求允许的最大页大小
    pub max_limit: u32,
}

/// 消息限制配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageConfig {
    /// 消息内容最大长度（字符）
    pub max_content_length: usize,
    /// 表情回应最大长度（字符）
    pub max_reaction_length: usize,
}

impl AppConfig {
    /// 从环境变量加载配置，缺失时使用默认值
    pub fn from_env() -> Self {
        Self {
            history: HistoryConfig {
                default_limit: env_or("CHAT_HISTORY_DEFAULT_LIMIT", 50),
                max_limit: env_or("CHAT_HISTORY_MAX_LIMIT", 200),
            },
            message: MessageConfig {
                max_content_length: env_or("CHAT_MAX_CONTENT_LENGTH", 4000),
                max_reaction_length: env_or("CHAT_MAX_REACTION_LENGTH", 32),
            },
        }
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history.default_limit == 0 {
            return Err(ConfigError::InvalidHistoryConfig(
                "default_limit must be greater than 0".to_string(),
            ));
        }
        if self.history.max_limit < self.history.default_limit {
            return Err(ConfigError::InvalidHistoryConfig(
                "max_limit must be >= default_limit".to_string(),
            ));
        }
        if self.message.max_content_length == 0 {
            return Err(ConfigError::InvalidMessageConfig(
                "max_content_length must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid history configuration: {0}")]
    InvalidHistoryConfig(String),
    #[error("Invalid message configuration: {0}")]
    InvalidMessageConfig(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

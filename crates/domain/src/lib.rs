//! 点对点聊天系统核心领域模型
//!
//! 包含用户、好友请求、会话、消息、拉黑关系等核心实体，
//! 以及投递状态机和仓储边界定义。

pub mod delivery;
pub mod entities;
pub mod errors;
pub mod repositories;
pub mod value_objects;

// 重新导出常用类型
pub use delivery::*;
pub use entities::*;
pub use errors::*;
pub use repositories::*;
pub use value_objects::*;

//! 仓储边界定义
//!
//! 核心对存储协作方只要求 CRUD、唯一性约束和事务隔离。
//! 两个竞态敏感的不变量被下推到这里作为硬性契约：
//! - 同一用户对并发 `find_or_create` 不会产生重复会话；
//! - 交叉好友请求的检查-创建-双翻转序列在单一隔离范围内执行。

pub mod blocked_pair_repository;
pub mod conversation_repository;
pub mod friend_request_repository;
pub mod message_repository;
pub mod user_repository;

pub use blocked_pair_repository::*;
pub use conversation_repository::*;
pub use friend_request_repository::*;
pub use message_repository::*;
pub use user_repository::*;

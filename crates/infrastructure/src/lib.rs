//! 基础设施层
//!
//! Repository 接口的内存实现。所有竞态关键的复合操作
//! （交叉好友请求握手、会话查找或创建）都在单个写锁内完成，
//! 与关系型实现中事务 + 唯一约束的隔离语义等价。

pub mod memory;

pub use memory::*;

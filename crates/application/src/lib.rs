//! 应用层：好友关系、会话、消息、拉黑等服务，
//! 在线状态注册表，以及把它们按入站事件编排起来的协调器。
//!
//! 每个入站事件先执行唯一的关键状态变更（失败即中止并上报，
//! 不留半成品），成功后再逐个尝试尽力而为的视图刷新推送，
//! 单个推送失败只记录日志，绝不回滚已提交的变更。

pub mod errors;
pub mod events;
pub mod orchestrator;
pub mod presence;
pub mod services;
pub mod views;

pub use errors::*;
pub use events::*;
pub use orchestrator::*;
pub use presence::*;
pub use services::*;
pub use views::*;

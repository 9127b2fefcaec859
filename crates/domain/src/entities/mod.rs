//! 领域实体定义

pub mod blocked_pair;
pub mod conversation;
pub mod friend_request;
pub mod message;
pub mod user;

pub use blocked_pair::*;
pub use conversation::*;
pub use friend_request::*;
pub use message::*;
pub use user::*;

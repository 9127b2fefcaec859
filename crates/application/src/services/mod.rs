//! 应用服务

pub mod block_service;
pub mod conversation_service;
pub mod friendship_service;
pub mod message_service;


pub use block_service::*;
pub use conversation_service::*;
pub use friendship_service::*;
pub use message_service::*;

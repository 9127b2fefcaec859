//! 内存存储实现

pub mod blocked_pair_store;
pub mod conversation_store;
pub mod friend_request_store;
pub mod message_store;
pub mod user_store;

pub use blocked_pair_store::MemoryBlockedPairStore;
pub use conversation_store::MemoryConversationStore;
pub use friend_request_store::MemoryFriendRequestStore;
pub use message_store::MemoryMessageStore;
pub use user_store::MemoryUserStore;

use std::sync::Arc;

use domain::{
    BlockedPairRepository, ConversationRepository, FriendRequestRepository, MessageRepository,
    UserRepository,
};

/// 一组内存存储的便捷打包，测试与示例装配使用。
#[derive(Clone)]
pub struct MemoryStores {
    pub users: Arc<dyn UserRepository>,
    pub requests: Arc<dyn FriendRequestRepository>,
    pub conversations: Arc<dyn ConversationRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub blocks: Arc<dyn BlockedPairRepository>,
}

impl MemoryStores {
    pub fn new() -> Self {
        Self {
            users: Arc::new(MemoryUserStore::new()),
            requests: Arc::new(MemoryFriendRequestStore::new()),
            conversations: Arc::new(MemoryConversationStore::new()),
            messages: Arc::new(MemoryMessageStore::new()),
            blocks: Arc::new(MemoryBlockedPairStore::new()),
        }
    }
}

impl Default for MemoryStores {
    fn default() -> Self {
        Self::new()
    }
}

//! 用户内存存储

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use domain::{Handle, RepositoryError, RepositoryResult, User, UserId, UserRepository};

/// 内存用户存储
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserStore {
    async fn create(&self, user: User) -> RepositoryResult<User> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(RepositoryError::conflict("user id already exists"));
        }
        if users
            .values()
            .any(|existing| existing.username == user.username && existing.tag == user.tag)
        {
            return Err(RepositoryError::conflict("handle already taken"));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_handle(&self, handle: &Handle) -> RepositoryResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.username == handle.username() && user.tag == handle.tag())
            .cloned())
    }
}

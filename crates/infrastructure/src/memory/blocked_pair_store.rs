//! 拉黑关系内存存储

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use domain::{BlockedPair, BlockedPairRepository, RepositoryResult, UserId};

/// 内存拉黑关系存储，键为有向的 (blocker, blocked)。
#[derive(Default)]
pub struct MemoryBlockedPairStore {
    pairs: RwLock<HashMap<(UserId, UserId), BlockedPair>>,
}

impl MemoryBlockedPairStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlockedPairRepository for MemoryBlockedPairStore {
    async fn insert(&self, pair: BlockedPair) -> RepositoryResult<BlockedPair> {
        let mut pairs = self.pairs.write().await;
        let key = (pair.blocker_id, pair.blocked_id);
        if let Some(existing) = pairs.get(&key) {
            return Ok(existing.clone());
        }
        pairs.insert(key, pair.clone());
        Ok(pair)
    }

    async fn remove(&self, blocker: UserId, blocked: UserId) -> RepositoryResult<bool> {
        Ok(self
            .pairs
            .write()
            .await
            .remove(&(blocker, blocked))
            .is_some())
    }

    async fn is_blocked(&self, blocker: UserId, blocked: UserId) -> RepositoryResult<bool> {
        Ok(self.pairs.read().await.contains_key(&(blocker, blocked)))
    }

    async fn list_blocked_by(&self, blocker: UserId) -> RepositoryResult<Vec<UserId>> {
        Ok(self
            .pairs
            .read()
            .await
            .keys()
            .filter(|(b, _)| *b == blocker)
            .map(|(_, blocked)| *blocked)
            .collect())
    }

    async fn list_blockers_of(&self, blocked: UserId) -> RepositoryResult<Vec<UserId>> {
        Ok(self
            .pairs
            .read()
            .await
            .keys()
            .filter(|(_, b)| *b == blocked)
            .map(|(blocker, _)| *blocker)
            .collect())
    }
}

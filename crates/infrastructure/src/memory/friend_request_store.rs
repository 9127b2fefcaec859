//! 好友请求内存存储
//!
//! `create_pending` 的检查-创建-翻转全程持有同一把写锁，
//! 等价于关系型实现中的事务加 (sender, receiver, PENDING)
//! 部分唯一索引。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use domain::{
    FriendRequest, FriendRequestRepository, FriendRequestStatus, PendingInsert, RepositoryError,
    RepositoryResult, RequestId, Timestamp, UserId, UserPair,
};

/// 内存好友请求存储
#[derive(Default)]
pub struct MemoryFriendRequestStore {
    requests: RwLock<HashMap<RequestId, FriendRequest>>,
}

impl MemoryFriendRequestStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FriendRequestRepository for MemoryFriendRequestStore {
    async fn find_by_id(&self, id: RequestId) -> RepositoryResult<Option<FriendRequest>> {
        Ok(self.requests.read().await.get(&id).cloned())
    }

    async fn update(&self, request: FriendRequest) -> RepositoryResult<FriendRequest> {
        let mut requests = self.requests.write().await;
        if !requests.contains_key(&request.id) {
            return Err(RepositoryError::not_found("friend request not found"));
        }
        requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn create_pending(
        &self,
        sender: UserId,
        receiver: UserId,
        now: Timestamp,
    ) -> RepositoryResult<PendingInsert> {
        let mut requests = self.requests.write().await;

        if requests
            .values()
            .any(|r| r.is_pending() && r.sender_id == sender && r.receiver_id == receiver)
        {
            return Err(RepositoryError::conflict(
                "pending request already exists for this direction",
            ));
        }

        let reverse_id = requests
            .values()
            .find(|r| r.is_pending() && r.sender_id == receiver && r.receiver_id == sender)
            .map(|r| r.id);

        let mut request = FriendRequest::new_pending(sender, receiver, now);
        match reverse_id {
            None => {
                requests.insert(request.id, request.clone());
                Ok(PendingInsert::Created(request))
            }
            Some(reverse_id) => {
                // 交叉请求：两条记录按 RequestId 升序翻转为 ACCEPTED
                request.respond(FriendRequestStatus::Accepted, now);
                let mut ids = [request.id, reverse_id];
                ids.sort();
                requests.insert(request.id, request.clone());
                for id in ids {
                    if let Some(row) = requests.get_mut(&id) {
                        if !row.is_accepted() {
                            row.respond(FriendRequestStatus::Accepted, now);
                        }
                    }
                }
                let reverse = requests
                    .get(&reverse_id)
                    .cloned()
                    .ok_or_else(|| RepositoryError::storage("reverse request vanished"))?;
                Ok(PendingInsert::AutoAccepted { request, reverse })
            }
        }
    }

    async fn find_accepted_between(
        &self,
        pair: UserPair,
    ) -> RepositoryResult<Option<FriendRequest>> {
        Ok(self
            .requests
            .read()
            .await
            .values()
            .find(|r| r.is_accepted() && r.touches(pair.lower()) && r.touches(pair.upper()))
            .cloned())
    }

    async fn list_accepted_touching(&self, user: UserId) -> RepositoryResult<Vec<FriendRequest>> {
        Ok(self
            .requests
            .read()
            .await
            .values()
            .filter(|r| r.is_accepted() && r.touches(user))
            .cloned()
            .collect())
    }

    async fn list_pending_for_receiver(
        &self,
        user: UserId,
    ) -> RepositoryResult<Vec<FriendRequest>> {
        let mut pending: Vec<FriendRequest> = self
            .requests
            .read()
            .await
            .values()
            .filter(|r| r.is_pending() && r.receiver_id == user)
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pending)
    }

    async fn count_pending_for_receiver(&self, user: UserId) -> RepositoryResult<u64> {
        Ok(self
            .requests
            .read()
            .await
            .values()
            .filter(|r| r.is_pending() && r.receiver_id == user)
            .count() as u64)
    }

    async fn delete_accepted_between(&self, pair: UserPair) -> RepositoryResult<bool> {
        let mut requests = self.requests.write().await;
        let ids: Vec<RequestId> = requests
            .values()
            .filter(|r| r.is_accepted() && r.touches(pair.lower()) && r.touches(pair.upper()))
            .map(|r| r.id)
            .collect();
        for id in &ids {
            requests.remove(id);
        }
        Ok(!ids.is_empty())
    }
}

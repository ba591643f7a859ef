use async_trait::async_trait;
use dashmap::DashMap;
use jiff::Timestamp;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{FriendRequest, FriendRequestStatus};
use crate::repositories::FriendRequestStore;

#[derive(Default)]
pub struct MemoryFriendRequestStore {
    requests: DashMap<Uuid, FriendRequest>,
}

#[async_trait]
impl FriendRequestStore for MemoryFriendRequestStore {
    async fn insert(&self, request: &FriendRequest) -> AppResult<()> {
        self.requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<FriendRequest>> {
        Ok(self.requests.get(&id).map(|r| r.value().clone()))
    }

    async fn find_pending_between(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> AppResult<Option<FriendRequest>> {
        Ok(self
            .requests
            .iter()
            .find(|r| r.sender_id == sender_id && r.receiver_id == receiver_id && r.is_pending())
            .map(|r| r.value().clone()))
    }

    async fn find_pending_for(&self, receiver_id: Uuid) -> AppResult<Vec<FriendRequest>> {
        let mut pending: Vec<FriendRequest> = self
            .requests
            .iter()
            .filter(|r| r.receiver_id == receiver_id && r.is_pending())
            .map(|r| r.value().clone())
            .collect();
        pending.sort_by_key(|r| r.created_at);
        Ok(pending)
    }

    async fn respond(
        &self,
        id: Uuid,
        status: FriendRequestStatus,
        responded_at: Timestamp,
    ) -> AppResult<bool> {
        Ok(match self.requests.get_mut(&id) {
            Some(mut request) if request.is_pending() => {
                request.status = status;
                request.responded_at = Some(responded_at);
                true
            }
            _ => false,
        })
    }
}

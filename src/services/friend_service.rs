//! Friend requests and the `friends` arrays they feed.

use std::sync::Arc;

use jiff::Timestamp;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{FriendRequest, FriendRequestStatus};
use crate::repositories::{FriendRequestStore, UserStore};

#[derive(Clone)]
pub struct FriendService {
    requests: Arc<dyn FriendRequestStore>,
    users: Arc<dyn UserStore>,
}

impl FriendService {
    pub fn new(requests: Arc<dyn FriendRequestStore>, users: Arc<dyn UserStore>) -> Self {
        Self { requests, users }
    }

    /// Opens a pending request from `sender_id` to `receiver_id`.
    ///
    /// # Returns
    /// The stored request, `NotFound` if either user is missing, `Validation`
    /// for self requests or existing friends, and `Duplicate` when a request in
    /// the same direction is still pending
    pub async fn send_request(&self, sender_id: Uuid, receiver_id: Uuid) -> AppResult<FriendRequest> {
        if sender_id == receiver_id {
            return Err(AppError::validation(
                "receiverId",
                "Cannot send a friend request to yourself",
            ));
        }

        let sender = self
            .users
            .find_by_id(sender_id)
            .await?
            .ok_or_else(|| AppError::not_found("users", "id", sender_id))?;
        if self.users.find_by_id(receiver_id).await?.is_none() {
            return Err(AppError::not_found("users", "id", receiver_id));
        }
        if sender.is_friend_with(receiver_id) {
            return Err(AppError::validation("receiverId", "Users are already friends"));
        }
        if self
            .requests
            .find_pending_between(sender_id, receiver_id)
            .await?
            .is_some()
        {
            return Err(AppError::Duplicate {
                entity: "friend_requests".to_string(),
                field: "receiver_id".to_string(),
                value: receiver_id.to_string(),
            });
        }

        let request = FriendRequest::new(sender_id, receiver_id);
        self.requests.insert(&request).await?;
        tracing::info!(
            request_id = %request.id,
            sender_id = %sender_id,
            receiver_id = %receiver_id,
            "Friend request sent"
        );
        Ok(request)
    }

    /// Accepts a pending request and links both users as friends.
    pub async fn accept(&self, request_id: Uuid, receiver_id: Uuid) -> AppResult<FriendRequest> {
        let request = self
            .respond(request_id, receiver_id, FriendRequestStatus::Accepted)
            .await?;

        self.users
            .add_friend(request.sender_id, request.receiver_id)
            .await?;
        self.users
            .add_friend(request.receiver_id, request.sender_id)
            .await?;
        Ok(request)
    }

    pub async fn decline(&self, request_id: Uuid, receiver_id: Uuid) -> AppResult<FriendRequest> {
        self.respond(request_id, receiver_id, FriendRequestStatus::Declined)
            .await
    }

    async fn respond(
        &self,
        request_id: Uuid,
        receiver_id: Uuid,
        status: FriendRequestStatus,
    ) -> AppResult<FriendRequest> {
        let mut request = self
            .requests
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::not_found("friend_requests", "id", request_id))?;

        if request.receiver_id != receiver_id {
            return Err(AppError::Forbidden {
                message: format!("friend request {request_id} is not addressed to {receiver_id}"),
            });
        }

        let responded_at = Timestamp::now();
        if !request.is_pending() || !self.requests.respond(request_id, status, responded_at).await? {
            return Err(AppError::validation(
                "status",
                format!("Friend request is already {}", request.status),
            ));
        }

        request.status = status;
        request.responded_at = Some(responded_at);
        tracing::info!(request_id = %request_id, %status, "Friend request answered");
        Ok(request)
    }

    /// Pending requests received by `user_id`, oldest first.
    pub async fn pending_for(&self, user_id: Uuid) -> AppResult<Vec<FriendRequest>> {
        self.requests.find_pending_for(user_id).await
    }

    /// Unlinks both directions; true if either side changed.
    pub async fn remove_friend(&self, user_id: Uuid, friend_id: Uuid) -> AppResult<bool> {
        let forward = self.users.remove_friend(user_id, friend_id).await?;
        let backward = self.users.remove_friend(friend_id, user_id).await?;
        Ok(forward || backward)
    }
}

//! Friend request store for async database operations.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff::Timestamp;
use jiff_diesel::ToDiesel;
use uuid::Uuid;

use super::rows::FriendRequestRow;
use crate::db::{AsyncDbPool, get_connection};
use crate::error::{AppError, AppResult};
use crate::models::{FriendRequest, FriendRequestStatus};
use crate::repositories::FriendRequestStore;

#[derive(Clone)]
pub struct PgFriendRequestStore {
    pool: AsyncDbPool,
}

impl PgFriendRequestStore {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FriendRequestStore for PgFriendRequestStore {
    async fn insert(&self, request: &FriendRequest) -> AppResult<()> {
        use crate::schema::friend_requests::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        diesel::insert_into(friend_requests)
            .values(FriendRequestRow::from(request))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn find_by_id(&self, request_id: Uuid) -> AppResult<Option<FriendRequest>> {
        use crate::schema::friend_requests::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        let row = friend_requests
            .filter(id.eq(request_id))
            .select(FriendRequestRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)?;
        Ok(row.map(FriendRequest::from))
    }

    async fn find_pending_between(
        &self,
        from: Uuid,
        to: Uuid,
    ) -> AppResult<Option<FriendRequest>> {
        use crate::schema::friend_requests::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        let row = friend_requests
            .filter(sender_id.eq(from))
            .filter(receiver_id.eq(to))
            .filter(status.eq(FriendRequestStatus::Pending))
            .select(FriendRequestRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)?;
        Ok(row.map(FriendRequest::from))
    }

    async fn find_pending_for(&self, receiver: Uuid) -> AppResult<Vec<FriendRequest>> {
        use crate::schema::friend_requests::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        let rows = friend_requests
            .filter(receiver_id.eq(receiver))
            .filter(status.eq(FriendRequestStatus::Pending))
            .order(created_at.asc())
            .select(FriendRequestRow::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;
        Ok(rows.into_iter().map(FriendRequest::from).collect())
    }

    async fn respond(
        &self,
        request_id: Uuid,
        new_status: FriendRequestStatus,
        at: Timestamp,
    ) -> AppResult<bool> {
        use crate::schema::friend_requests::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        // Only a pending request may transition
        let updated = diesel::update(
            friend_requests
                .filter(id.eq(request_id))
                .filter(status.eq(FriendRequestStatus::Pending)),
        )
        .set((status.eq(new_status), responded_at.eq(Some(at.to_diesel()))))
        .execute(&mut conn)
        .await
        .map_err(AppError::from)?;
        Ok(updated > 0)
    }
}

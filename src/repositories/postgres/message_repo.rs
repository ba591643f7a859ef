//! Message store for async database operations.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use super::rows::MessageRow;
use crate::db::{AsyncDbPool, get_connection};
use crate::error::{AppError, AppResult};
use crate::models::Message;
use crate::repositories::MessageStore;

#[derive(Clone)]
pub struct PgMessageStore {
    pool: AsyncDbPool,
}

impl PgMessageStore {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn find_for_user(&self, participant: Uuid) -> AppResult<Vec<Message>> {
        use crate::schema::messages::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        let rows = messages
            .filter(sender_id.eq(participant).or(receiver_id.eq(participant)))
            .select(MessageRow::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;
        Ok(rows.into_iter().map(Message::from).collect())
    }

    async fn insert(&self, message: &Message) -> AppResult<()> {
        use crate::schema::messages::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        diesel::insert_into(messages)
            .values(MessageRow::from(message))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn replace(&self, message: &Message) -> AppResult<usize> {
        use crate::schema::messages::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        diesel::update(messages.filter(id.eq(message.id)))
            .set(&MessageRow::from(message))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }
}

//! User store for async database operations.
//!
//! Provides CRUD operations for the users table using diesel_async.

use async_trait::async_trait;
use diesel::dsl::not;
use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use super::rows::UserRow;
use crate::db::sql::{array_append, array_remove};
use crate::db::{AsyncDbPool, get_connection};
use crate::error::{AppError, AppResult};
use crate::models::{PreferencesUpdate, User};
use crate::repositories::UserStore;

/// Name of the index created for the users primary key
const PRIMARY_KEY_INDEX: &str = "users_pkey";

#[derive(QueryableByName)]
struct IndexName {
    #[diesel(sql_type = Text)]
    indexname: String,
}

/// Changeset for the preference columns; `None` leaves a column untouched.
#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::users)]
struct PreferencesChangeset<'a> {
    push_notifications_enabled: Option<bool>,
    email_notifications_enabled: Option<bool>,
    notification_sounds_enabled: Option<bool>,
    dark_mode_enabled: Option<bool>,
    theme: Option<&'a str>,
    font_size: Option<&'a str>,
    two_factor_enabled: Option<bool>,
}

impl<'a> From<&'a PreferencesUpdate> for PreferencesChangeset<'a> {
    fn from(update: &'a PreferencesUpdate) -> Self {
        Self {
            push_notifications_enabled: update.push_notifications_enabled,
            email_notifications_enabled: update.email_notifications_enabled,
            notification_sounds_enabled: update.notification_sounds_enabled,
            dark_mode_enabled: update.dark_mode_enabled,
            theme: update.theme.as_deref(),
            font_size: update.font_size.as_deref(),
            two_factor_enabled: update.two_factor_enabled,
        }
    }
}

/// User store holding an async connection pool.
///
/// Since `AsyncDbPool` (bb8::Pool) internally uses `Arc`, cloning is cheap.
#[derive(Clone)]
pub struct PgUserStore {
    pool: AsyncDbPool,
}

impl PgUserStore {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list_all(&self) -> AppResult<Vec<User>> {
        use crate::schema::users::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        let rows = users
            .order(created_at.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<User>> {
        use crate::schema::users::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        let row = users
            .filter(id.eq(user_id))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)?;
        Ok(row.map(User::from))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<User>> {
        use crate::schema::users::dsl::*;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = get_connection(&self.pool).await?;

        let rows = users
            .filter(id.eq_any(ids))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn find_by_email(&self, user_email: &str) -> AppResult<Option<User>> {
        use crate::schema::users::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        let row = users
            .filter(email.eq(user_email))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)?;
        Ok(row.map(User::from))
    }

    async fn insert(&self, user: &User) -> AppResult<()> {
        use crate::schema::users::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        diesel::insert_into(users)
            .values(UserRow::from(user))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn replace(&self, user: &User) -> AppResult<usize> {
        use crate::schema::users::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        diesel::update(users.filter(id.eq(user.id)))
            .set(&UserRow::from(user))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn set_cover_picture(&self, user_id: Uuid, path: &str) -> AppResult<usize> {
        use crate::schema::users::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        diesel::update(users.filter(id.eq(user_id)))
            .set(cover_picture.eq(path))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn set_profile_picture(&self, user_id: Uuid, path: &str) -> AppResult<usize> {
        use crate::schema::users::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        diesel::update(users.filter(id.eq(user_id)))
            .set(profile_picture.eq(path))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn update_preferences(
        &self,
        user_id: Uuid,
        update: &PreferencesUpdate,
    ) -> AppResult<usize> {
        use crate::schema::users::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        diesel::update(users.filter(id.eq(user_id)))
            .set(PreferencesChangeset::from(update))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn add_friend(&self, user_id: Uuid, friend_id: Uuid) -> AppResult<bool> {
        use crate::schema::users::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        let updated = diesel::update(
            users
                .filter(id.eq(user_id))
                .filter(not(friends.contains(vec![friend_id]))),
        )
        .set(friends.eq(array_append(friends, friend_id)))
        .execute(&mut conn)
        .await
        .map_err(AppError::from)?;
        Ok(updated > 0)
    }

    async fn remove_friend(&self, user_id: Uuid, friend_id: Uuid) -> AppResult<bool> {
        use crate::schema::users::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        let updated = diesel::update(
            users
                .filter(id.eq(user_id))
                .filter(friends.contains(vec![friend_id])),
        )
        .set(friends.eq(array_remove(friends, friend_id)))
        .execute(&mut conn)
        .await
        .map_err(AppError::from)?;
        Ok(updated > 0)
    }

    async fn delete(&self, user_id: Uuid) -> AppResult<usize> {
        use crate::schema::users::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        diesel::delete(users.filter(id.eq(user_id)))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn initialize_indexes(&self) -> AppResult<()> {
        let mut conn = get_connection(&self.pool).await?;

        let existing: Vec<IndexName> = diesel::sql_query(
            "SELECT indexname FROM pg_indexes WHERE schemaname = current_schema() AND tablename = 'users'",
        )
        .load(&mut conn)
        .await
        .map_err(AppError::from)?;

        let mut dropped = 0usize;
        for index in existing
            .iter()
            .filter(|index| index.indexname != PRIMARY_KEY_INDEX)
        {
            tracing::debug!(index = %index.indexname, "Dropping users index");
            // Index names come from the catalog, quoted as identifiers
            diesel::sql_query(format!(
                "DROP INDEX IF EXISTS \"{}\"",
                index.indexname.replace('"', "\"\"")
            ))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;
            dropped += 1;
        }

        diesel::sql_query("CREATE UNIQUE INDEX IF NOT EXISTS users_email_key ON users (email)")
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        tracing::info!(dropped, "Users indexes initialised");
        Ok(())
    }
}

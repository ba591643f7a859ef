//! Article store for async database operations.
//!
//! Likes, comments and counters are changed with single-statement updates so
//! concurrent writers on the same article never lose each other's changes.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::{Text, Uuid as SqlUuid};
use diesel_async::RunQueryDsl;
use serde_json::json;
use uuid::Uuid;

use super::rows::{ArticleRow, CommentDoc};
use crate::db::{AsyncDbPool, get_connection};
use crate::error::{AppError, AppResult};
use crate::models::{Article, Comment};
use crate::repositories::ArticleStore;

/// Rewrites `comments` without the entry matching both comment id and author.
/// The `EXISTS` guard keeps the matched count at zero when nothing matches.
const PULL_COMMENT_SQL: &str = "\
UPDATE articles SET comments = COALESCE(\
    (SELECT jsonb_agg(c) FROM jsonb_array_elements(comments) c \
     WHERE NOT (c->>'id' = $2 AND c->>'userId' = $3)), '[]'::jsonb) \
WHERE id = $1 AND EXISTS (\
    SELECT 1 FROM jsonb_array_elements(comments) c \
    WHERE c->>'id' = $2 AND c->>'userId' = $3)";

/// Removes the liker if present, appends it otherwise. The row matches
/// whenever the article exists.
const TOGGLE_LIKE_SQL: &str = "\
UPDATE articles SET likes = CASE WHEN likes @> ARRAY[$2]::uuid[] \
    THEN array_remove(likes, $2) ELSE array_append(likes, $2) END \
WHERE id = $1";

#[derive(Clone)]
pub struct PgArticleStore {
    pool: AsyncDbPool,
}

impl PgArticleStore {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

fn into_articles(rows: Vec<ArticleRow>) -> AppResult<Vec<Article>> {
    rows.into_iter().map(ArticleRow::into_article).collect()
}

#[async_trait]
impl ArticleStore for PgArticleStore {
    async fn list_all(&self) -> AppResult<Vec<Article>> {
        use crate::schema::articles::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        let rows = articles
            .order(created_at.desc())
            .select(ArticleRow::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;
        into_articles(rows)
    }

    async fn find_by_id(&self, article_id: Uuid) -> AppResult<Option<Article>> {
        use crate::schema::articles::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        articles
            .filter(id.eq(article_id))
            .select(ArticleRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)?
            .map(ArticleRow::into_article)
            .transpose()
    }

    async fn find_by_user(&self, owner_id: Uuid) -> AppResult<Vec<Article>> {
        use crate::schema::articles::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        let rows = articles
            .filter(user_id.eq(owner_id))
            .order(created_at.desc())
            .select(ArticleRow::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;
        into_articles(rows)
    }

    async fn find_by_users(&self, owner_ids: &[Uuid]) -> AppResult<Vec<Article>> {
        use crate::schema::articles::dsl::*;
        if owner_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = get_connection(&self.pool).await?;

        let rows = articles
            .filter(user_id.eq_any(owner_ids))
            .order(created_at.desc())
            .select(ArticleRow::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;
        into_articles(rows)
    }

    async fn insert(&self, article: &Article) -> AppResult<()> {
        use crate::schema::articles::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        diesel::insert_into(articles)
            .values(ArticleRow::from_article(article)?)
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn replace(&self, article: &Article) -> AppResult<usize> {
        use crate::schema::articles::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        diesel::update(articles.filter(id.eq(article.id)))
            .set(&ArticleRow::from_article(article)?)
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn delete(&self, article_id: Uuid) -> AppResult<usize> {
        use crate::schema::articles::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        diesel::delete(articles.filter(id.eq(article_id)))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn delete_all(&self) -> AppResult<usize> {
        use crate::schema::articles::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        diesel::delete(articles)
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn toggle_like(&self, article_id: Uuid, liker_id: Uuid) -> AppResult<bool> {
        let mut conn = get_connection(&self.pool).await?;

        let matched = diesel::sql_query(TOGGLE_LIKE_SQL)
            .bind::<SqlUuid, _>(article_id)
            .bind::<SqlUuid, _>(liker_id)
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;
        Ok(matched > 0)
    }

    async fn push_comment(&self, article_id: Uuid, comment: &Comment) -> AppResult<usize> {
        use crate::schema::articles::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        diesel::update(articles.filter(id.eq(article_id)))
            .set(comments.eq(comments.concat(json!([CommentDoc::from(comment)]))))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn pull_comment(
        &self,
        article_id: Uuid,
        comment_id: Uuid,
        author_id: Uuid,
    ) -> AppResult<bool> {
        let mut conn = get_connection(&self.pool).await?;

        let removed = diesel::sql_query(PULL_COMMENT_SQL)
            .bind::<SqlUuid, _>(article_id)
            .bind::<Text, _>(comment_id.to_string())
            .bind::<Text, _>(author_id.to_string())
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;
        Ok(removed > 0)
    }

    async fn increment_share_count(&self, article_id: Uuid) -> AppResult<bool> {
        use crate::schema::articles::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        let updated = diesel::update(articles.filter(id.eq(article_id)))
            .set(share_count.eq(share_count + 1))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;
        Ok(updated > 0)
    }

    async fn increment_views(&self, article_id: Uuid) -> AppResult<bool> {
        use crate::schema::articles::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        let updated = diesel::update(articles.filter(id.eq(article_id)))
            .set(views.eq(views + 1))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;
        Ok(updated > 0)
    }

    async fn views(&self, article_id: Uuid) -> AppResult<Option<i64>> {
        use crate::schema::articles::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        articles
            .filter(id.eq(article_id))
            .select(views)
            .first::<i64>(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let mut conn = get_connection(&self.pool).await?;

        diesel::sql_query("CREATE INDEX IF NOT EXISTS articles_user_id_idx ON articles (user_id)")
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}

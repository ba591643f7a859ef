//! Store traits shared by every backend.
//!
//! Absence is reported through `Option`, `bool` or a matched-row count and is
//! never an error. `AppError::Duplicate` is reserved for the email index.

use async_trait::async_trait;
use jiff::Timestamp;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    Article, Comment, FriendRequest, FriendRequestStatus, Message, PreferencesUpdate, User,
};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list_all(&self) -> AppResult<Vec<User>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Users whose id is in `ids`; unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<User>>;

    /// Exact match on the stored (already normalised) email.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Inserts a new document. Fails with `Duplicate` when the email is taken.
    async fn insert(&self, user: &User) -> AppResult<()>;

    /// Full-document replace by id, returning the number of matched documents.
    async fn replace(&self, user: &User) -> AppResult<usize>;

    async fn set_cover_picture(&self, id: Uuid, path: &str) -> AppResult<usize>;

    async fn set_profile_picture(&self, id: Uuid, path: &str) -> AppResult<usize>;

    async fn update_preferences(&self, id: Uuid, update: &PreferencesUpdate) -> AppResult<usize>;

    /// Adds `friend_id` to the friend set; false if absent user or already present.
    async fn add_friend(&self, id: Uuid, friend_id: Uuid) -> AppResult<bool>;

    async fn remove_friend(&self, id: Uuid, friend_id: Uuid) -> AppResult<bool>;

    async fn delete(&self, id: Uuid) -> AppResult<usize>;

    /// Drops every secondary index and recreates the unique email index.
    async fn initialize_indexes(&self) -> AppResult<()>;
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// All articles, newest first.
    async fn list_all(&self) -> AppResult<Vec<Article>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Article>>;

    /// Articles owned by `user_id`, newest first.
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<Article>>;

    /// Articles owned by any of `user_ids`, newest first.
    async fn find_by_users(&self, user_ids: &[Uuid]) -> AppResult<Vec<Article>>;

    async fn insert(&self, article: &Article) -> AppResult<()>;

    async fn replace(&self, article: &Article) -> AppResult<usize>;

    async fn delete(&self, id: Uuid) -> AppResult<usize>;

    async fn delete_all(&self) -> AppResult<usize>;

    /// Pulls `user_id` from the likes if present, pushes it otherwise.
    /// Returns false when the article does not exist.
    async fn toggle_like(&self, article_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// Appends to the embedded comments; matched count is 0 for an unknown article.
    async fn push_comment(&self, article_id: Uuid, comment: &Comment) -> AppResult<usize>;

    /// Removes the comment matching both `comment_id` and `user_id`.
    async fn pull_comment(
        &self,
        article_id: Uuid,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<bool>;

    async fn increment_share_count(&self, id: Uuid) -> AppResult<bool>;

    async fn increment_views(&self, id: Uuid) -> AppResult<bool>;

    async fn views(&self, id: Uuid) -> AppResult<Option<i64>>;

    /// Ensures the owner index exists.
    async fn ensure_indexes(&self) -> AppResult<()>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Messages sent or received by `user_id`, in no particular order.
    async fn find_for_user(&self, user_id: Uuid) -> AppResult<Vec<Message>>;

    async fn insert(&self, message: &Message) -> AppResult<()>;

    async fn replace(&self, message: &Message) -> AppResult<usize>;
}

#[async_trait]
pub trait FriendRequestStore: Send + Sync {
    async fn insert(&self, request: &FriendRequest) -> AppResult<()>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<FriendRequest>>;

    async fn find_pending_between(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> AppResult<Option<FriendRequest>>;

    /// Pending requests addressed to `receiver_id`, oldest first.
    async fn find_pending_for(&self, receiver_id: Uuid) -> AppResult<Vec<FriendRequest>>;

    /// Moves a pending request to `status`; false if it was not pending.
    async fn respond(
        &self,
        id: Uuid,
        status: FriendRequestStatus,
        responded_at: Timestamp,
    ) -> AppResult<bool>;
}

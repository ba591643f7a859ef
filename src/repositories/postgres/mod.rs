//! PostgreSQL backend built on diesel-async.

mod article_repo;
mod friend_request_repo;
mod message_repo;
mod rows;
mod user_repo;

pub use article_repo::PgArticleStore;
pub use friend_request_repo::PgFriendRequestStore;
pub use message_repo::PgMessageStore;
pub use user_repo::PgUserStore;

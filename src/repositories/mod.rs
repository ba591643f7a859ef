//! Repository layer for data access operations.
//!
//! Every collection sits behind a store trait with a PostgreSQL backend and an
//! in-memory backend. Services only ever see the trait objects.

pub mod memory;
pub mod postgres;
mod traits;

pub use traits::{ArticleStore, FriendRequestStore, MessageStore, UserStore};

use std::sync::Arc;

use crate::db::AsyncDbPool;

/// Aggregates all stores for convenient access.
///
/// Cloning only bumps the `Arc` counts; every clone shares the same backend.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserStore>,
    pub articles: Arc<dyn ArticleStore>,
    pub messages: Arc<dyn MessageStore>,
    pub friend_requests: Arc<dyn FriendRequestStore>,
}

impl Repositories {
    /// Creates PostgreSQL-backed stores sharing one connection pool.
    ///
    /// # Arguments
    /// * `pool` - The async database connection pool
    pub fn postgres(pool: AsyncDbPool) -> Self {
        Self {
            users: Arc::new(postgres::PgUserStore::new(pool.clone())),
            articles: Arc::new(postgres::PgArticleStore::new(pool.clone())),
            messages: Arc::new(postgres::PgMessageStore::new(pool.clone())),
            friend_requests: Arc::new(postgres::PgFriendRequestStore::new(pool)),
        }
    }

    /// Creates empty process-local stores.
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(memory::MemoryUserStore::default()),
            articles: Arc::new(memory::MemoryArticleStore::default()),
            messages: Arc::new(memory::MemoryMessageStore::default()),
            friend_requests: Arc::new(memory::MemoryFriendRequestStore::default()),
        }
    }
}

//! In-memory backend built on DashMap.
//!
//! Each collection is a `DashMap` keyed by id. Mutations go through
//! `get_mut`, which holds the shard lock for the duration of the change, so
//! every single-document update is atomic like its SQL counterpart.

mod article_store;
mod friend_request_store;
mod message_store;
mod user_store;

pub use article_store::MemoryArticleStore;
pub use friend_request_store::MemoryFriendRequestStore;
pub use message_store::MemoryMessageStore;
pub use user_store::MemoryUserStore;

use jiff::Timestamp;

/// Sorts documents newest first by their creation time.
fn newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> Timestamp) {
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
}

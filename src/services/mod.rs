//! Service layer for business logic operations.
//!
//! Services hold `Arc<dyn ...>` store handles and never know which backend
//! sits behind them.

mod article_service;
mod friend_service;
mod message_service;
mod user_service;

pub use article_service::{ArticleService, attach_author, attach_comment_author};
pub use friend_service::FriendService;
pub use message_service::{MessageService, group_conversations};
pub use user_service::UserService;

use crate::repositories::Repositories;

/// Aggregates all services for convenient access.
///
/// Cloning is cheap since every service only holds `Arc` handles.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub articles: ArticleService,
    pub messages: MessageService,
    pub friends: FriendService,
}

impl Services {
    /// Creates a new Services instance from Repositories.
    pub fn new(repos: Repositories) -> Self {
        Self {
            users: UserService::new(repos.users.clone()),
            articles: ArticleService::new(repos.articles, repos.users.clone()),
            messages: MessageService::new(repos.messages, repos.users.clone()),
            friends: FriendService::new(repos.friend_requests, repos.users),
        }
    }
}

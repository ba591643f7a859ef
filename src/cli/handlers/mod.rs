//! Command handlers for CLI operations
//!
//! Each handler renders its output to a string so the rendering can be
//! tested without capturing stdout.

pub mod check;
pub mod conversations;
pub mod feed;
pub mod migrate;

pub use check::CheckCommandHandler;
pub use conversations::ConversationsCommandHandler;
pub use feed::FeedCommandHandler;
pub use migrate::MigrateCommandHandler;

use serde::Serialize;

use crate::error::{AppError, AppResult};

pub(crate) fn to_pretty_json<T: Serialize>(value: &T) -> AppResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| AppError::Internal {
        source: anyhow::Error::from(e),
    })
}

mod article;
mod friend_request;
mod message;
mod user;

pub use article::{Article, ArticleInput, Comment};
pub use friend_request::{FriendRequest, FriendRequestStatus};
pub use message::{Conversation, Message, NewMessage};
pub use user::{
    AuthorProfile, NewUser, PreferencesUpdate, ProfileUpdate, RegisterUser, User, UserPreferences,
    normalize_email,
};

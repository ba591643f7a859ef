//! Row shapes for the PostgreSQL tables and their conversions to models.

use bigdecimal::BigDecimal;
use diesel::prelude::*;
use jiff_diesel::ToDiesel;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Article, Comment, FriendRequest, FriendRequestStatus, Message, User, UserPreferences,
};

/// One `users` row. Used for reads, inserts and full replaces; the changeset
/// skips the primary key and writes `NULL` for `None`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub profile_picture: String,
    pub cover_picture: String,
    pub phone: String,
    pub residence: String,
    pub birthdate: Option<jiff_diesel::Date>,
    pub bio: String,
    pub is_registration_complete: bool,
    pub friends: Vec<Uuid>,
    pub push_notifications_enabled: bool,
    pub email_notifications_enabled: bool,
    pub notification_sounds_enabled: bool,
    pub dark_mode_enabled: bool,
    pub theme: String,
    pub font_size: String,
    pub two_factor_enabled: bool,
    pub last_password_change: Option<jiff_diesel::Timestamp>,
    pub created_at: jiff_diesel::Timestamp,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            password_hash: row.password_hash,
            profile_picture: row.profile_picture,
            cover_picture: row.cover_picture,
            phone: row.phone,
            residence: row.residence,
            birthdate: row.birthdate.map(|d| d.to_jiff()),
            bio: row.bio,
            is_registration_complete: row.is_registration_complete,
            friends: row.friends,
            preferences: UserPreferences {
                push_notifications_enabled: row.push_notifications_enabled,
                email_notifications_enabled: row.email_notifications_enabled,
                notification_sounds_enabled: row.notification_sounds_enabled,
                dark_mode_enabled: row.dark_mode_enabled,
                theme: row.theme,
                font_size: row.font_size,
                two_factor_enabled: row.two_factor_enabled,
                last_password_change: row.last_password_change.map(|t| t.to_jiff()),
            },
            created_at: row.created_at.to_jiff(),
        }
    }
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        let preferences = &user.preferences;
        UserRow {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            password_hash: user.password_hash.clone(),
            profile_picture: user.profile_picture.clone(),
            cover_picture: user.cover_picture.clone(),
            phone: user.phone.clone(),
            residence: user.residence.clone(),
            birthdate: user.birthdate.map(|d| d.to_diesel()),
            bio: user.bio.clone(),
            is_registration_complete: user.is_registration_complete,
            friends: user.friends.clone(),
            push_notifications_enabled: preferences.push_notifications_enabled,
            email_notifications_enabled: preferences.email_notifications_enabled,
            notification_sounds_enabled: preferences.notification_sounds_enabled,
            dark_mode_enabled: preferences.dark_mode_enabled,
            theme: preferences.theme.clone(),
            font_size: preferences.font_size.clone(),
            two_factor_enabled: preferences.two_factor_enabled,
            last_password_change: preferences.last_password_change.map(|t| t.to_diesel()),
            created_at: user.created_at.to_diesel(),
        }
    }
}

/// Persisted part of a comment inside `articles.comments`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDoc {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: jiff::Timestamp,
}

impl From<&Comment> for CommentDoc {
    fn from(comment: &Comment) -> Self {
        CommentDoc {
            id: comment.id,
            user_id: comment.user_id,
            content: comment.content.clone(),
            created_at: comment.created_at,
        }
    }
}

impl From<CommentDoc> for Comment {
    fn from(doc: CommentDoc) -> Self {
        Comment {
            id: doc.id,
            user_id: doc.user_id,
            content: doc.content,
            created_at: doc.created_at,
            author_username: String::new(),
            author_profile_picture: String::new(),
        }
    }
}

pub fn comments_to_json(comments: &[Comment]) -> AppResult<serde_json::Value> {
    let docs: Vec<CommentDoc> = comments.iter().map(CommentDoc::from).collect();
    serde_json::to_value(docs).map_err(|e| AppError::Internal {
        source: anyhow::Error::from(e),
    })
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::articles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ArticleRow {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub price: BigDecimal,
    pub location: String,
    pub description: String,
    pub contact: String,
    pub image_path: String,
    pub user_id: Uuid,
    pub created_at: jiff_diesel::Timestamp,
    pub likes: Vec<Uuid>,
    pub comments: serde_json::Value,
    pub share_count: i64,
    pub views: i64,
}

impl ArticleRow {
    pub fn from_article(article: &Article) -> AppResult<Self> {
        Ok(ArticleRow {
            id: article.id,
            title: article.title.clone(),
            content: article.content.clone(),
            price: article.price.clone(),
            location: article.location.clone(),
            description: article.description.clone(),
            contact: article.contact.clone(),
            image_path: article.image_path.clone(),
            user_id: article.user_id,
            created_at: article.created_at.to_diesel(),
            likes: article.likes.clone(),
            comments: comments_to_json(&article.comments)?,
            share_count: article.share_count,
            views: article.views,
        })
    }

    pub fn into_article(self) -> AppResult<Article> {
        let docs: Vec<CommentDoc> =
            serde_json::from_value(self.comments).map_err(|e| AppError::Database {
                operation: "decode article comments".to_string(),
                source: anyhow::Error::from(e),
            })?;

        Ok(Article {
            id: self.id,
            title: self.title,
            content: self.content,
            price: self.price,
            location: self.location,
            description: self.description,
            contact: self.contact,
            image_path: self.image_path,
            user_id: self.user_id,
            created_at: self.created_at.to_jiff(),
            likes: self.likes,
            comments: docs.into_iter().map(Comment::from).collect(),
            share_count: self.share_count,
            views: self.views,
            author_first_name: String::new(),
            author_last_name: String::new(),
            author_username: String::new(),
            author_profile_picture: String::new(),
            has_liked: false,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MessageRow {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub created_at: jiff_diesel::Timestamp,
    pub is_read: bool,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            sender_id: row.sender_id,
            receiver_id: row.receiver_id,
            content: row.content,
            created_at: row.created_at.to_jiff(),
            is_read: row.is_read,
        }
    }
}

impl From<&Message> for MessageRow {
    fn from(message: &Message) -> Self {
        MessageRow {
            id: message.id,
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            content: message.content.clone(),
            created_at: message.created_at.to_diesel(),
            is_read: message.is_read,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::friend_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FriendRequestRow {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: FriendRequestStatus,
    pub created_at: jiff_diesel::Timestamp,
    pub responded_at: Option<jiff_diesel::Timestamp>,
}

impl From<FriendRequestRow> for FriendRequest {
    fn from(row: FriendRequestRow) -> Self {
        FriendRequest {
            id: row.id,
            sender_id: row.sender_id,
            receiver_id: row.receiver_id,
            status: row.status,
            created_at: row.created_at.to_jiff(),
            responded_at: row.responded_at.map(|t| t.to_jiff()),
        }
    }
}

impl From<&FriendRequest> for FriendRequestRow {
    fn from(request: &FriendRequest) -> Self {
        FriendRequestRow {
            id: request.id,
            sender_id: request.sender_id,
            receiver_id: request.receiver_id,
            status: request.status,
            created_at: request.created_at.to_diesel(),
            responded_at: request.responded_at.map(|t| t.to_diesel()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArticleInput, NewUser};

    #[test]
    fn test_user_row_round_trip_keeps_preferences() {
        let mut user = User::new(NewUser {
            email: "a@x.com".to_string(),
            first_name: "Ada".to_string(),
            ..Default::default()
        });
        user.preferences.dark_mode_enabled = true;
        user.friends.push(Uuid::new_v4());

        let back = User::from(UserRow::from(&user));
        assert_eq!(back, user);
    }

    #[test]
    fn test_article_row_drops_transient_fields() {
        let mut article = Article::new(Uuid::new_v4(), ArticleInput::titled("Bike", 100));
        article.author_first_name = "Ada".to_string();
        article.has_liked = true;
        let mut comment = Comment::new(Uuid::new_v4(), "nice");
        comment.author_username = "ada".to_string();
        article.comments.push(comment.clone());

        let row = ArticleRow::from_article(&article).unwrap();
        assert!(row.comments[0].get("authorUsername").is_none());
        assert_eq!(row.comments[0]["userId"], comment.user_id.to_string());

        let back = row.into_article().unwrap();
        assert_eq!(back.author_first_name, "");
        assert!(!back.has_liked);
        assert_eq!(back.comments[0].id, comment.id);
        assert_eq!(back.comments[0].author_username, "");
    }
}

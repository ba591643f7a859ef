use bigdecimal::BigDecimal;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// A comment embedded in its parent article.
///
/// Only `id`, `user_id`, `content` and `created_at` are persisted; the author
/// fields are filled at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: Timestamp,
    #[serde(default)]
    pub author_username: String,
    #[serde(default)]
    pub author_profile_picture: String,
}

impl Comment {
    pub fn new(user_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            content: content.into(),
            created_at: Timestamp::now(),
            author_username: String::new(),
            author_profile_picture: String::new(),
        }
    }
}

/// A marketplace listing.
///
/// `likes` has set semantics: a user id appears at most once. The `author_*`
/// fields and `has_liked` are never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub price: BigDecimal,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub image_path: String,
    pub user_id: Uuid,
    pub created_at: Timestamp,
    #[serde(default)]
    pub likes: Vec<Uuid>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub share_count: i64,
    #[serde(default)]
    pub views: i64,

    #[serde(default)]
    pub author_first_name: String,
    #[serde(default)]
    pub author_last_name: String,
    #[serde(default)]
    pub author_username: String,
    #[serde(default)]
    pub author_profile_picture: String,
    #[serde(default)]
    pub has_liked: bool,
}

impl Article {
    /// Builds a new listing owned by `user_id` with zeroed counters.
    pub fn new(user_id: Uuid, input: ArticleInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            content: input.content,
            price: input.price,
            location: input.location,
            description: input.description,
            contact: input.contact,
            image_path: input.image_path,
            user_id,
            created_at: Timestamp::now(),
            likes: Vec::new(),
            comments: Vec::new(),
            share_count: 0,
            views: 0,
            author_first_name: String::new(),
            author_last_name: String::new(),
            author_username: String::new(),
            author_profile_picture: String::new(),
            has_liked: false,
        }
    }

    /// Overwrites the editable fields, keeping identity, owner and counters.
    pub fn apply(&mut self, input: ArticleInput) {
        self.title = input.title.trim().to_string();
        self.content = input.content;
        self.price = input.price;
        self.location = input.location;
        self.description = input.description;
        self.contact = input.contact;
        self.image_path = input.image_path;
    }

    pub fn is_liked_by(&self, user_id: Uuid) -> bool {
        self.likes.contains(&user_id)
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("Title is required".into());
        return Err(error);
    }
    Ok(())
}

/// Editable listing fields as submitted by a client
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ArticleInput {
    #[serde(alias = "Title")]
    #[validate(
        length(max = 255, message = "Title must be at most 255 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: String,
    #[serde(default, alias = "Content")]
    pub content: String,
    #[serde(default, alias = "Price")]
    pub price: BigDecimal,
    #[serde(default, alias = "Location")]
    pub location: String,
    #[serde(default, alias = "Description")]
    pub description: String,
    #[serde(default, alias = "Contact")]
    pub contact: String,
    #[serde(default, alias = "ImagePath")]
    pub image_path: String,
}

impl ArticleInput {
    pub fn titled(title: impl Into<String>, price: impl Into<BigDecimal>) -> Self {
        Self {
            title: title.into(),
            content: String::new(),
            price: price.into(),
            location: String::new(),
            description: String::new(),
            contact: String::new(),
            image_path: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_title_is_rejected() {
        let input = ArticleInput::titled("   ", 10);
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }

    #[test]
    fn test_article_input_accepts_pascal_case() {
        let json = r#"{"Title":"Bike","Price":"100.50","Location":"Lyon"}"#;
        let input: ArticleInput = serde_json::from_str(json).expect("PascalCase payload parses");
        assert_eq!(input.title, "Bike");
        assert_eq!(input.location, "Lyon");
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_new_article_starts_with_zero_counters() {
        let owner = Uuid::new_v4();
        let article = Article::new(owner, ArticleInput::titled(" Bike ", 100));
        assert_eq!(article.title, "Bike");
        assert!(article.is_owned_by(owner));
        assert!(article.likes.is_empty());
        assert_eq!(article.share_count, 0);
        assert_eq!(article.views, 0);
        assert!(!article.has_liked);
    }

    #[test]
    fn test_apply_keeps_identity_and_counters() {
        let owner = Uuid::new_v4();
        let mut article = Article::new(owner, ArticleInput::titled("Bike", 100));
        article.views = 7;
        article.likes.push(Uuid::new_v4());
        let id = article.id;

        article.apply(ArticleInput::titled("Road bike", 150));

        assert_eq!(article.id, id);
        assert_eq!(article.title, "Road bike");
        assert_eq!(article.price, BigDecimal::from(150));
        assert_eq!(article.views, 7);
        assert_eq!(article.likes.len(), 1);
    }
}

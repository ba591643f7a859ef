//! Feed command handler

use uuid::Uuid;

use super::to_pretty_json;
use crate::error::AppResult;
use crate::state::AppState;

pub struct FeedCommandHandler {
    state: AppState,
}

impl FeedCommandHandler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// The feed as seen by `viewer`: every article, or only friends' ones.
    pub async fn render(&self, viewer: Uuid, friends_only: bool) -> AppResult<String> {
        let articles = &self.state.services.articles;
        let feed = if friends_only {
            articles.find_for_friends_of(viewer).await?
        } else {
            articles.find_all(Some(viewer)).await?
        };
        tracing::debug!(viewer = %viewer, friends_only, count = feed.len(), "Rendering feed");
        to_pretty_json(&feed)
    }

    pub async fn execute(&self, viewer: Uuid, friends_only: bool) -> AppResult<()> {
        println!("{}", self.render(viewer, friends_only).await?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArticleInput, NewUser};

    #[tokio::test]
    async fn test_render_feed_as_camel_case_json() {
        let state = AppState::in_memory();
        let ada = state
            .services
            .users
            .create(NewUser {
                email: "a@x.com".to_string(),
                first_name: "Ada".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let bike = state
            .services
            .articles
            .create(ada.id, ArticleInput::titled("Bike", 100))
            .await
            .unwrap();
        state.services.articles.toggle_like(bike.id, ada.id).await.unwrap();

        let handler = FeedCommandHandler::new(state);
        let json: serde_json::Value =
            serde_json::from_str(&handler.render(ada.id, false).await.unwrap()).unwrap();

        assert_eq!(json[0]["title"], "Bike");
        assert_eq!(json[0]["authorFirstName"], "Ada");
        assert_eq!(json[0]["hasLiked"], true);

        let friends = handler.render(ada.id, true).await.unwrap();
        assert_eq!(friends.trim(), "[]");
    }
}

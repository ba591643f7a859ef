//! Conversations command handler

use uuid::Uuid;

use super::to_pretty_json;
use crate::error::AppResult;
use crate::state::AppState;

pub struct ConversationsCommandHandler {
    state: AppState,
}

impl ConversationsCommandHandler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn render(&self, user: Uuid) -> AppResult<String> {
        let conversations = self.state.services.messages.conversations(user).await?;
        to_pretty_json(&conversations)
    }

    pub async fn execute(&self, user: Uuid) -> AppResult<()> {
        println!("{}", self.render(user).await?);
        Ok(())
    }
}

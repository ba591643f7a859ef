use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::Message;
use crate::repositories::MessageStore;

#[derive(Default)]
pub struct MemoryMessageStore {
    messages: DashMap<Uuid, Message>,
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn find_for_user(&self, user_id: Uuid) -> AppResult<Vec<Message>> {
        Ok(self
            .messages
            .iter()
            .filter(|m| m.sender_id == user_id || m.receiver_id == user_id)
            .map(|m| m.value().clone())
            .collect())
    }

    async fn insert(&self, message: &Message) -> AppResult<()> {
        self.messages.insert(message.id, message.clone());
        Ok(())
    }

    async fn replace(&self, message: &Message) -> AppResult<usize> {
        Ok(match self.messages.get_mut(&message.id) {
            Some(mut stored) => {
                *stored = message.clone();
                1
            }
            None => 0,
        })
    }
}

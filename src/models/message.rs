use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A direct message. `is_read` only ever moves from false to true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub created_at: Timestamp,
    #[serde(default)]
    pub is_read: bool,
}

impl Message {
    /// A fresh unread message stamped with the current time.
    pub fn new(sender_id: Uuid, receiver_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            content: content.into(),
            created_at: Timestamp::now(),
            is_read: false,
        }
    }

    /// The other participant as seen from `user_id`.
    pub fn counterpart(&self, user_id: Uuid) -> Uuid {
        if self.sender_id == user_id {
            self.receiver_id
        } else {
            self.sender_id
        }
    }

    pub fn involves(&self, user_id: Uuid, other_id: Uuid) -> bool {
        (self.sender_id == user_id && self.receiver_id == other_id)
            || (self.sender_id == other_id && self.receiver_id == user_id)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    #[serde(alias = "ReceiverId")]
    pub receiver_id: Uuid,
    #[serde(alias = "Content")]
    #[validate(length(min = 1, max = 5000, message = "Message content must be 1 to 5000 characters"))]
    pub content: String,
}

/// One entry of a user's conversation list, keyed by the counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Counterpart user id
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub profile_picture: String,
    pub last_message: String,
    pub last_message_time: Timestamp,
    /// Unread messages sent by the counterpart
    pub unread_count: usize,
}

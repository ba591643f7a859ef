//! Direct messages and conversation summaries.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{Conversation, Message, NewMessage};
use crate::repositories::{MessageStore, UserStore};

/// Groups a user's messages by counterpart.
///
/// Each entry previews the most recent message of that pair and counts the
/// unread messages the counterpart sent. Display fields are left blank.
/// Entries are ordered by last message time, newest first.
pub fn group_conversations(user_id: Uuid, messages: &[Message]) -> Vec<Conversation> {
    let mut groups: HashMap<Uuid, Conversation> = HashMap::new();

    for message in messages {
        let counterpart = message.counterpart(user_id);
        let entry = groups.entry(counterpart).or_insert_with(|| Conversation {
            id: counterpart,
            first_name: String::new(),
            last_name: String::new(),
            profile_picture: String::new(),
            last_message: message.content.clone(),
            last_message_time: message.created_at,
            unread_count: 0,
        });

        if message.created_at > entry.last_message_time {
            entry.last_message = message.content.clone();
            entry.last_message_time = message.created_at;
        }
        if message.sender_id == counterpart && !message.is_read {
            entry.unread_count += 1;
        }
    }

    let mut conversations: Vec<Conversation> = groups.into_values().collect();
    conversations.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));
    conversations
}

#[derive(Clone)]
pub struct MessageService {
    messages: Arc<dyn MessageStore>,
    users: Arc<dyn UserStore>,
}

impl MessageService {
    pub fn new(messages: Arc<dyn MessageStore>, users: Arc<dyn UserStore>) -> Self {
        Self { messages, users }
    }

    /// Sends a message from `sender_id`; the receiver must exist.
    pub async fn send(&self, sender_id: Uuid, input: NewMessage) -> AppResult<Message> {
        let content = input.content.trim();
        if content.is_empty() {
            return Err(AppError::validation("content", "Message content is required"));
        }
        input.validate()?;

        if self.users.find_by_id(input.receiver_id).await?.is_none() {
            return Err(AppError::not_found("users", "id", input.receiver_id));
        }

        let message = Message::new(sender_id, input.receiver_id, content);
        self.messages.insert(&message).await?;
        tracing::info!(
            message_id = %message.id,
            sender_id = %sender_id,
            receiver_id = %message.receiver_id,
            "Message sent"
        );
        Ok(message)
    }

    /// Every message sent or received by `user_id`, unordered.
    pub async fn find_for_user(&self, user_id: Uuid) -> AppResult<Vec<Message>> {
        self.messages.find_for_user(user_id).await
    }

    /// Full replace of a stored message.
    pub async fn update(&self, message: &Message) -> AppResult<bool> {
        Ok(self.messages.replace(message).await? > 0)
    }

    /// Conversation list for `user_id` with counterpart names and avatars.
    pub async fn conversations(&self, user_id: Uuid) -> AppResult<Vec<Conversation>> {
        let messages = self.messages.find_for_user(user_id).await?;
        let mut conversations = group_conversations(user_id, &messages);

        let ids: Vec<Uuid> = conversations.iter().map(|c| c.id).collect();
        let users: HashMap<Uuid, _> = self
            .users
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();

        for conversation in &mut conversations {
            match users.get(&conversation.id) {
                Some(user) => {
                    conversation.first_name = user.first_name.clone();
                    conversation.last_name = user.last_name.clone();
                    conversation.profile_picture = user.profile_picture.clone();
                }
                None => {
                    tracing::warn!(counterpart = %conversation.id, "Conversation with unknown user")
                }
            }
        }
        tracing::debug!(user_id = %user_id, count = conversations.len(), "Grouped conversations");
        Ok(conversations)
    }

    /// Messages between `user_id` and `other_id`, oldest first.
    ///
    /// Unread messages `user_id` received in this thread are marked read.
    pub async fn thread(&self, user_id: Uuid, other_id: Uuid) -> AppResult<Vec<Message>> {
        let mut thread: Vec<Message> = self
            .messages
            .find_for_user(user_id)
            .await?
            .into_iter()
            .filter(|m| m.involves(user_id, other_id))
            .collect();
        thread.sort_by_key(|m| m.created_at);

        let mut marked = 0usize;
        for message in thread
            .iter_mut()
            .filter(|m| m.receiver_id == user_id && !m.is_read)
        {
            message.is_read = true;
            if self.update(message).await? {
                marked += 1;
            }
        }
        if marked > 0 {
            tracing::info!(user_id = %user_id, other_id = %other_id, marked, "Messages marked read");
        }
        Ok(thread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUser, User};
    use crate::repositories::Repositories;
    use jiff::{SignedDuration, Timestamp};
    use proptest::prelude::*;

    fn at(message: Message, seconds: i64) -> Message {
        Message {
            created_at: Timestamp::UNIX_EPOCH + SignedDuration::from_secs(seconds),
            ..message
        }
    }

    async fn user(repos: &Repositories, email: &str, first_name: &str) -> User {
        let user = User::new(NewUser {
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: "Tester".to_string(),
            ..Default::default()
        });
        repos.users.insert(&user).await.unwrap();
        user
    }

    fn to(receiver_id: Uuid, content: &str) -> NewMessage {
        NewMessage {
            receiver_id,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_group_conversations_previews_latest_message() {
        let me = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let eve = Uuid::new_v4();
        let messages = vec![
            at(Message::new(bob, me, "hi"), 10),
            at(Message::new(me, bob, "hello"), 20),
            at(Message::new(eve, me, "ping"), 15),
            at(Message::new(eve, me, "ping?"), 5),
        ];

        let conversations = group_conversations(me, &messages);
        assert_eq!(conversations.len(), 2);

        assert_eq!(conversations[0].id, bob);
        assert_eq!(conversations[0].last_message, "hello");
        assert_eq!(conversations[0].unread_count, 1);

        assert_eq!(conversations[1].id, eve);
        assert_eq!(conversations[1].last_message, "ping");
        assert_eq!(conversations[1].unread_count, 2);
    }

    #[test]
    fn test_own_unread_messages_are_not_counted() {
        let me = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let conversations = group_conversations(me, &[Message::new(me, bob, "unseen by bob")]);
        assert_eq!(conversations[0].unread_count, 0);
    }

    proptest! {
        #[test]
        fn prop_one_conversation_per_counterpart(
            raw in proptest::collection::vec((0usize..4, any::<bool>(), any::<bool>(), 0i64..1000), 0..40)
        ) {
            let me = Uuid::new_v4();
            let others: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
            let messages: Vec<Message> = raw
                .iter()
                .map(|&(who, outgoing, read, secs)| {
                    let other = others[who];
                    let message = if outgoing {
                        Message::new(me, other, "m")
                    } else {
                        Message::new(other, me, "m")
                    };
                    Message { is_read: read, ..at(message, secs) }
                })
                .collect();

            let conversations = group_conversations(me, &messages);

            let mut expected: Vec<Uuid> = messages.iter().map(|m| m.counterpart(me)).collect();
            expected.sort();
            expected.dedup();
            let mut ids: Vec<Uuid> = conversations.iter().map(|c| c.id).collect();
            ids.sort();
            prop_assert_eq!(ids, expected);

            for conversation in &conversations {
                let unread = messages
                    .iter()
                    .filter(|m| m.sender_id == conversation.id && !m.is_read)
                    .count();
                prop_assert_eq!(conversation.unread_count, unread);
            }
            for pair in conversations.windows(2) {
                prop_assert!(pair[0].last_message_time >= pair[1].last_message_time);
            }
        }
    }

    #[tokio::test]
    async fn test_send_validates_content_and_receiver() {
        let repos = Repositories::in_memory();
        let messages = MessageService::new(repos.messages.clone(), repos.users.clone());
        let ada = user(&repos, "a@x.com", "Ada").await;

        let err = messages.send(ada.id, to(Uuid::new_v4(), "hi")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));

        let err = messages.send(ada.id, to(ada.id, "   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_conversations_are_enriched() {
        let repos = Repositories::in_memory();
        let messages = MessageService::new(repos.messages.clone(), repos.users.clone());
        let ada = user(&repos, "a@x.com", "Ada").await;
        let bob = user(&repos, "b@x.com", "Bob").await;

        messages.send(bob.id, to(ada.id, "Is the bike sold?")).await.unwrap();
        messages.send(bob.id, to(ada.id, "Hello?")).await.unwrap();

        let conversations = messages.conversations(ada.id).await.unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].id, bob.id);
        assert_eq!(conversations[0].first_name, "Bob");
        assert_eq!(conversations[0].unread_count, 2);

        let bobs_view = messages.conversations(bob.id).await.unwrap();
        assert_eq!(bobs_view[0].unread_count, 0);
    }

    #[tokio::test]
    async fn test_thread_marks_only_received_messages_read() {
        let repos = Repositories::in_memory();
        let messages = MessageService::new(repos.messages.clone(), repos.users.clone());
        let ada = user(&repos, "a@x.com", "Ada").await;
        let bob = user(&repos, "b@x.com", "Bob").await;
        let eve = user(&repos, "e@x.com", "Eve").await;

        messages.send(bob.id, to(ada.id, "one")).await.unwrap();
        messages.send(ada.id, to(bob.id, "two")).await.unwrap();
        messages.send(eve.id, to(ada.id, "other thread")).await.unwrap();

        let thread = messages.thread(ada.id, bob.id).await.unwrap();
        assert_eq!(thread.len(), 2);
        assert!(thread.windows(2).all(|w| w[0].created_at <= w[1].created_at));

        let stored = messages.find_for_user(ada.id).await.unwrap();
        let from_bob = stored.iter().find(|m| m.sender_id == bob.id).unwrap();
        let to_bob = stored.iter().find(|m| m.receiver_id == bob.id).unwrap();
        let from_eve = stored.iter().find(|m| m.sender_id == eve.id).unwrap();
        assert!(from_bob.is_read);
        assert!(!to_bob.is_read);
        assert!(!from_eve.is_read);

        let conversations = messages.conversations(ada.id).await.unwrap();
        let with_eve = conversations.iter().find(|c| c.id == eve.id).unwrap();
        assert_eq!(with_eve.unread_count, 1);
    }
}

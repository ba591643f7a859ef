use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{PreferencesUpdate, User};
use crate::repositories::UserStore;

fn duplicate_email(email: &str) -> AppError {
    AppError::Duplicate {
        entity: "users".to_string(),
        field: "email".to_string(),
        value: email.to_string(),
    }
}

/// Users keyed by id, plus an email index that plays the unique index role.
#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<Uuid, User>,
    emails: DashMap<String, Uuid>,
}

impl MemoryUserStore {
    fn update_field(&self, id: Uuid, change: impl FnOnce(&mut User)) -> usize {
        match self.users.get_mut(&id) {
            Some(mut user) => {
                change(&mut user);
                1
            }
            None => 0,
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list_all(&self) -> AppResult<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<User>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| u.value().clone()))
            .collect())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let Some(id) = self.emails.get(email).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn insert(&self, user: &User) -> AppResult<()> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(duplicate_email(&user.email)),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user.clone());
                Ok(())
            }
        }
    }

    async fn replace(&self, user: &User) -> AppResult<usize> {
        // `emails` is locked before `users`, as in `insert`
        let Some(previous_email) = self.users.get(&user.id).map(|u| u.email.clone()) else {
            return Ok(0);
        };

        if previous_email != user.email {
            match self.emails.entry(user.email.clone()) {
                Entry::Occupied(owner) if *owner.get() != user.id => {
                    return Err(duplicate_email(&user.email));
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert(user.id);
                }
            }
            self.emails.remove_if(&previous_email, |_, owner| *owner == user.id);
        }

        match self.users.get_mut(&user.id) {
            Some(mut stored) => {
                *stored = user.clone();
                Ok(1)
            }
            None => {
                self.emails.remove_if(&user.email, |_, owner| *owner == user.id);
                Ok(0)
            }
        }
    }

    async fn set_cover_picture(&self, id: Uuid, path: &str) -> AppResult<usize> {
        Ok(self.update_field(id, |user| user.cover_picture = path.to_string()))
    }

    async fn set_profile_picture(&self, id: Uuid, path: &str) -> AppResult<usize> {
        Ok(self.update_field(id, |user| user.profile_picture = path.to_string()))
    }

    async fn update_preferences(&self, id: Uuid, update: &PreferencesUpdate) -> AppResult<usize> {
        Ok(self.update_field(id, |user| update.apply(&mut user.preferences)))
    }

    async fn add_friend(&self, id: Uuid, friend_id: Uuid) -> AppResult<bool> {
        Ok(match self.users.get_mut(&id) {
            Some(mut user) if !user.friends.contains(&friend_id) => {
                user.friends.push(friend_id);
                true
            }
            _ => false,
        })
    }

    async fn remove_friend(&self, id: Uuid, friend_id: Uuid) -> AppResult<bool> {
        Ok(match self.users.get_mut(&id) {
            Some(mut user) => {
                let before = user.friends.len();
                user.friends.retain(|f| *f != friend_id);
                user.friends.len() != before
            }
            None => false,
        })
    }

    async fn delete(&self, id: Uuid) -> AppResult<usize> {
        match self.users.remove(&id) {
            Some((_, user)) => {
                self.emails.remove(&user.email);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn initialize_indexes(&self) -> AppResult<()> {
        // Rebuild the email index from the documents themselves
        let entries: Vec<(String, Uuid)> = self
            .users
            .iter()
            .map(|user| (user.email.clone(), user.id))
            .collect();

        self.emails.clear();
        for (email, id) in entries {
            match self.emails.entry(email) {
                Entry::Occupied(slot) => return Err(duplicate_email(slot.key())),
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use std::sync::Arc;
    use std::time::Duration;

    fn user(email: &str) -> User {
        User::new(NewUser {
            email: email.to_string(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_insert_rejects_taken_email() {
        let store = MemoryUserStore::default();
        store.insert(&user("a@x.com")).await.unwrap();

        let err = store.insert(&user("a@x.com")).await.unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_replace_moves_email_index() {
        let store = MemoryUserStore::default();
        let mut ada = user("ada@x.com");
        store.insert(&ada).await.unwrap();

        ada.email = "lovelace@x.com".to_string();
        assert_eq!(store.replace(&ada).await.unwrap(), 1);

        assert!(store.find_by_email("ada@x.com").await.unwrap().is_none());
        assert_eq!(
            store.find_by_email("lovelace@x.com").await.unwrap().map(|u| u.id),
            Some(ada.id)
        );
    }

    #[tokio::test]
    async fn test_replace_onto_taken_email_fails() {
        let store = MemoryUserStore::default();
        let mut ada = user("ada@x.com");
        store.insert(&ada).await.unwrap();
        store.insert(&user("grace@x.com")).await.unwrap();

        ada.email = "grace@x.com".to_string();
        assert!(store.replace(&ada).await.unwrap_err().is_duplicate());
    }

    #[tokio::test]
    async fn test_friend_set_semantics() {
        let store = MemoryUserStore::default();
        let ada = user("ada@x.com");
        store.insert(&ada).await.unwrap();
        let friend = Uuid::new_v4();

        assert!(store.add_friend(ada.id, friend).await.unwrap());
        assert!(!store.add_friend(ada.id, friend).await.unwrap());
        assert!(store.remove_friend(ada.id, friend).await.unwrap());
        assert!(!store.remove_friend(ada.id, friend).await.unwrap());
        assert!(!store.add_friend(Uuid::new_v4(), friend).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_and_email_changes_finish() {
        let store = Arc::new(MemoryUserStore::default());

        let workers = (0..4).map(|worker| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let mut own = user(&format!("w{worker}@x.com"));
                store.insert(&own).await.unwrap();
                for round in 0..500 {
                    store
                        .insert(&user(&format!("w{worker}-{round}@x.com")))
                        .await
                        .unwrap();
                    own.email = format!("w{worker}-moved-{round}@x.com");
                    assert_eq!(store.replace(&own).await.unwrap(), 1);
                }
                own
            })
        });
        let workers: Vec<_> = workers.collect();

        let finished = tokio::time::timeout(Duration::from_secs(60), async {
            let mut owners = Vec::new();
            for worker in workers {
                owners.push(worker.await.unwrap());
            }
            owners
        })
        .await
        .expect("workers finish without deadlocking");

        for own in finished {
            let found = store.find_by_email(&own.email).await.unwrap();
            assert_eq!(found.map(|u| u.id), Some(own.id));
        }
        assert_eq!(store.emails.len(), store.users.len());
        store.initialize_indexes().await.unwrap();
        assert_eq!(store.emails.len(), 4 * 501);
    }

    #[tokio::test]
    async fn test_replace_of_deleted_user_leaves_no_index_entry() {
        let store = MemoryUserStore::default();
        let mut ada = user("ada@x.com");
        store.insert(&ada).await.unwrap();
        store.delete(ada.id).await.unwrap();

        ada.email = "lovelace@x.com".to_string();
        assert_eq!(store.replace(&ada).await.unwrap(), 0);
        assert!(store.emails.is_empty());
        store.insert(&user("lovelace@x.com")).await.unwrap();
    }
}

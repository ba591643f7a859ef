//! User service for business logic operations.
//!
//! Wraps the `UserStore` with the rules of the users collection: email
//! normalisation and uniqueness, registration, authentication and the
//! partial profile updates.

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{
    NewUser, PreferencesUpdate, ProfileUpdate, RegisterUser, User, normalize_email,
};
use crate::repositories::UserStore;
use crate::utils::password::{hash_password, verify_password};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn duplicate_email(email: &str) -> AppError {
    AppError::Duplicate {
        entity: "users".to_string(),
        field: "email".to_string(),
        value: email.to_string(),
    }
}

/// User service for handling user-related business logic.
///
/// Cloning only clones the store handle.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    /// Creates a new UserService with the given store.
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Creates a new user.
    ///
    /// The email is trimmed and lowercased before the uniqueness pre-check.
    /// The pre-check is not atomic with the insert; a racing insert is still
    /// rejected by the store's unique email index.
    ///
    /// # Returns
    /// The stored user, `Validation` for an empty email, or `Duplicate`
    pub async fn create(&self, mut new_user: NewUser) -> AppResult<User> {
        new_user.email = normalize_email(&new_user.email);
        if new_user.email.is_empty() {
            return Err(AppError::validation("email", "Email is required"));
        }

        if self.store.find_by_email(&new_user.email).await?.is_some() {
            tracing::warn!(email = %new_user.email, "Rejected user with taken email");
            return Err(duplicate_email(&new_user.email));
        }

        let user = User::new(new_user);
        self.store.insert(&user).await?;
        tracing::info!(user_id = %user.id, email = %user.email, "User created");
        Ok(user)
    }

    /// Lists all users.
    pub async fn find_all(&self) -> AppResult<Vec<User>> {
        self.store.list_all().await
    }

    /// Gets a user by id; absence is `None`, never an error.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        tracing::debug!(user_id = %id, "Looking up user");
        self.store.find_by_id(id).await
    }

    /// Gets a user by email, normalising the input first.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.store.find_by_email(&normalize_email(email)).await
    }

    /// Replaces the whole user document stored under `id`.
    ///
    /// # Returns
    /// The user as written, or `NotFound` if no document matched
    pub async fn update(&self, id: Uuid, mut user: User) -> AppResult<User> {
        user.id = id;
        user.email = normalize_email(&user.email);

        let matched = self.store.replace(&user).await?;
        if matched == 0 {
            return Err(AppError::not_found("users", "id", id));
        }
        tracing::info!(user_id = %id, "User updated");
        Ok(user)
    }

    /// Sets the cover picture and returns the re-read user.
    pub async fn update_cover_picture(&self, id: Uuid, path: &str) -> AppResult<User> {
        let matched = self.store.set_cover_picture(id, path).await?;
        self.reread_after_update(id, matched).await
    }

    /// Sets the profile picture and returns the re-read user.
    pub async fn update_profile_picture(&self, id: Uuid, path: &str) -> AppResult<User> {
        let matched = self.store.set_profile_picture(id, path).await?;
        self.reread_after_update(id, matched).await
    }

    /// Writes only the preference fields present in `update`.
    pub async fn update_preferences(
        &self,
        id: Uuid,
        update: PreferencesUpdate,
    ) -> AppResult<User> {
        if update.is_empty() {
            return Err(AppError::validation(
                "preferences",
                "No preference fields to update",
            ));
        }
        let matched = self.store.update_preferences(id, &update).await?;
        self.reread_after_update(id, matched).await
    }

    // Zero matches and a missing re-read are both reported as NotFound; the
    // window between the two round trips is tolerated.
    async fn reread_after_update(&self, id: Uuid, matched: usize) -> AppResult<User> {
        if matched == 0 {
            return Err(AppError::not_found("users", "id", id));
        }
        let user = self.store.find_by_id(id).await?;
        user.ok_or_else(|| {
            tracing::warn!(user_id = %id, "User vanished after update");
            AppError::not_found("users", "id", id)
        })
    }

    /// Self-service registration.
    ///
    /// Validates the payload, derives the `first.last` username, hashes the
    /// password and creates a completed user.
    pub async fn register(&self, input: RegisterUser) -> AppResult<User> {
        let input = input.trimmed();
        input.validate()?;

        let username = format!("{}.{}", input.first_name, input.last_name).to_lowercase();

        self.create(NewUser {
            email: input.email,
            username,
            first_name: input.first_name,
            last_name: input.last_name,
            password_hash: hash_password(&input.password)?,
            phone: input.phone.unwrap_or_default(),
            residence: input.residence.unwrap_or_default(),
            birthdate: input.birthdate,
            is_registration_complete: true,
            ..Default::default()
        })
        .await
    }

    /// Checks credentials.
    ///
    /// Unknown email and wrong password both yield the same `Unauthorized`.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<User> {
        let unauthorized = || AppError::Unauthorized {
            message: INVALID_CREDENTIALS.to_string(),
        };

        let Some(user) = self.find_by_email(email).await? else {
            return Err(unauthorized());
        };
        if user.password_hash.is_empty() || !verify_password(password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "Password mismatch");
            return Err(unauthorized());
        }
        Ok(user)
    }

    /// Marks the user with `email` as having finished registration.
    pub async fn complete_registration(&self, email: &str) -> AppResult<User> {
        let mut user = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found("users", "email", normalize_email(email)))?;
        user.is_registration_complete = true;
        self.update(user.id, user).await
    }

    /// Applies a profile edit through a full replace.
    pub async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> AppResult<User> {
        let update = update.trimmed();
        update.validate()?;

        let mut user = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("users", "id", id))?;
        update.apply(&mut user);
        self.update(id, user).await
    }

    /// Deletes a user. Articles and messages are left in place.
    ///
    /// # Returns
    /// `true` if the user was deleted, `false` if not found
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let affected = self.store.delete(id).await?;
        if affected == 0 {
            tracing::warn!(user_id = %id, "Delete matched no user");
        }
        Ok(affected > 0)
    }

    /// Resolves a user's friend ids into users; empty when the user is absent.
    pub async fn list_friends(&self, id: Uuid) -> AppResult<Vec<User>> {
        match self.store.find_by_id(id).await? {
            Some(user) => self.store.find_by_ids(&user.friends).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn initialize_indexes(&self) -> AppResult<()> {
        self.store.initialize_indexes().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::Repositories;

    fn service() -> UserService {
        UserService::new(Repositories::in_memory().users)
    }

    fn new_user(email: &str, first_name: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            first_name: first_name.to_string(),
            username: first_name.to_lowercase(),
            ..Default::default()
        }
    }

    fn registration(email: &str) -> RegisterUser {
        RegisterUser {
            email: email.to_string(),
            password: "secret-pass".to_string(),
            first_name: " Ada ".to_string(),
            last_name: "Lovelace".to_string(),
            phone: None,
            residence: Some(" London ".to_string()),
            birthdate: None,
        }
    }

    #[tokio::test]
    async fn test_create_normalises_email() {
        let users = service();
        let user = users.create(new_user("  A@X.com ", "Ada")).await.unwrap();

        assert_eq!(user.email, "a@x.com");
        assert!(users.find_by_email("a@x.com").await.unwrap().is_some());
        assert!(users.find_by_email(" A@x.COM").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_rejects_empty_email() {
        let err = service().create(new_user("   ", "Ada")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "email"));
    }

    #[tokio::test]
    async fn test_second_create_with_same_email_conflicts() {
        let users = service();
        let first = users.create(new_user("a@x.com", "Ada")).await.unwrap();

        let err = users.create(new_user(" A@X.COM", "Eve")).await.unwrap_err();
        assert!(err.is_duplicate());

        let stored = users.find_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, first.id);
        assert_eq!(stored[0].first_name, "Ada");
    }

    #[tokio::test]
    async fn test_concurrent_creates_store_one_user() {
        let users = service();
        let (a, b) = tokio::join!(
            users.create(new_user("race@x.com", "Ada")),
            users.create(new_user("race@x.com", "Eve")),
        );

        assert_eq!(usize::from(a.is_ok()) + usize::from(b.is_ok()), 1);
        assert_eq!(users.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_missing_is_none() {
        let users = service();
        assert!(users.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
        assert!(users.find_by_email("nobody@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let users = service();
        let ghost = User::new(new_user("ghost@x.com", "Ghost"));
        let err = users.update(ghost.id, ghost).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_keeps_path_id() {
        let users = service();
        let ada = users.create(new_user("a@x.com", "Ada")).await.unwrap();

        let mut changed = ada.clone();
        changed.id = Uuid::new_v4();
        changed.first_name = "Augusta".to_string();
        let updated = users.update(ada.id, changed).await.unwrap();

        assert_eq!(updated.id, ada.id);
        let stored = users.find_by_id(ada.id).await.unwrap().unwrap();
        assert_eq!(stored.first_name, "Augusta");
    }

    #[tokio::test]
    async fn test_update_cover_picture() {
        let users = service();
        let ada = users.create(new_user("a@x.com", "Ada")).await.unwrap();

        let updated = users
            .update_cover_picture(ada.id, "/uploads/cover.png")
            .await
            .unwrap();
        assert_eq!(updated.cover_picture, "/uploads/cover.png");

        let err = users
            .update_cover_picture(Uuid::new_v4(), "/x.png")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_profile_picture() {
        let users = service();
        let ada = users.create(new_user("a@x.com", "Ada")).await.unwrap();

        let updated = users
            .update_profile_picture(ada.id, "/uploads/me.png")
            .await
            .unwrap();
        assert_eq!(updated.profile_picture, "/uploads/me.png");
    }

    #[tokio::test]
    async fn test_update_preferences() {
        let users = service();
        let ada = users.create(new_user("a@x.com", "Ada")).await.unwrap();

        let updated = users
            .update_preferences(
                ada.id,
                PreferencesUpdate {
                    dark_mode_enabled: Some(true),
                    theme: Some("Ocean".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(updated.preferences.dark_mode_enabled);
        assert_eq!(updated.preferences.theme, "Ocean");
        assert!(updated.preferences.push_notifications_enabled);
    }

    #[tokio::test]
    async fn test_empty_preferences_update_is_rejected() {
        let users = service();
        let ada = users.create(new_user("a@x.com", "Ada")).await.unwrap();

        let err = users
            .update_preferences(ada.id, PreferencesUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let err = users
            .update_preferences(
                Uuid::new_v4(),
                PreferencesUpdate {
                    two_factor_enabled: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_register_then_authenticate() {
        let users = service();
        let user = users.register(registration("Ada@X.com")).await.unwrap();

        assert_eq!(user.email, "ada@x.com");
        assert_eq!(user.username, "ada.lovelace");
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.residence, "London");
        assert!(user.is_registration_complete);
        assert_ne!(user.password_hash, "secret-pass");

        let logged_in = users.authenticate(" ADA@x.com", "secret-pass").await.unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn test_authenticate_does_not_reveal_which_part_failed() {
        let users = service();
        users.register(registration("ada@x.com")).await.unwrap();

        let wrong_password = users.authenticate("ada@x.com", "nope-nope").await.unwrap_err();
        let unknown_email = users.authenticate("eve@x.com", "secret-pass").await.unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, AppError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let mut input = registration("ada@x.com");
        input.password = "123".to_string();
        let err = service().register(input).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "password"));

        let err = service().register(registration("not-an-email")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "email"));
    }

    #[tokio::test]
    async fn test_register_rejects_whitespace_names() {
        let users = service();
        let mut input = registration("ada@x.com");
        input.first_name = "   ".to_string();
        input.last_name = "  ".to_string();

        let err = users.register(input).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert!(users.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_accepts_padded_email_and_names() {
        let users = service();
        let mut input = registration("  Ada@X.com ");
        input.first_name = " Ada ".to_string();

        let user = users.register(input).await.unwrap();
        assert_eq!(user.email, "ada@x.com");
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.username, "ada.lovelace");
        assert_eq!(users.authenticate("ada@x.com", "secret-pass").await.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn test_complete_registration() {
        let users = service();
        users.create(new_user("a@x.com", "Ada")).await.unwrap();

        let user = users.complete_registration("A@x.com").await.unwrap();
        assert!(user.is_registration_complete);

        let err = users.complete_registration("eve@x.com").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let users = service();
        let ada = users.create(new_user("a@x.com", "Ada")).await.unwrap();

        let updated = users
            .update_profile(
                ada.id,
                ProfileUpdate {
                    last_name: Some(" King ".to_string()),
                    bio: Some("Analyst".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.first_name, "Ada");
        assert_eq!(updated.last_name, "King");
        assert_eq!(updated.bio, "Analyst");

        let err = users
            .update_profile(
                ada.id,
                ProfileUpdate {
                    first_name: Some("A".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let err = users
            .update_profile(
                ada.id,
                ProfileUpdate {
                    first_name: Some("    ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        let stored = users.find_by_id(ada.id).await.unwrap().unwrap();
        assert_eq!(stored.first_name, "Ada");
    }

    #[tokio::test]
    async fn test_delete_and_list_friends() {
        let repos = Repositories::in_memory();
        let users = UserService::new(repos.users.clone());
        let ada = users.create(new_user("a@x.com", "Ada")).await.unwrap();
        let bob = users.create(new_user("b@x.com", "Bob")).await.unwrap();
        repos.users.add_friend(ada.id, bob.id).await.unwrap();

        let friends = users.list_friends(ada.id).await.unwrap();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].id, bob.id);

        assert!(users.delete(bob.id).await.unwrap());
        assert!(!users.delete(bob.id).await.unwrap());
        assert!(users.list_friends(ada.id).await.unwrap().is_empty());
        assert!(users.list_friends(Uuid::new_v4()).await.unwrap().is_empty());
    }
}

use jiff::Timestamp;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

fn default_theme() -> String {
    "Default".to_string()
}

fn default_font_size() -> String {
    "Medium".to_string()
}

fn default_true() -> bool {
    true
}

/// Notification, appearance and security settings stored with each user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default = "default_true")]
    pub push_notifications_enabled: bool,
    #[serde(default = "default_true")]
    pub email_notifications_enabled: bool,
    #[serde(default = "default_true")]
    pub notification_sounds_enabled: bool,
    #[serde(default)]
    pub dark_mode_enabled: bool,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_font_size")]
    pub font_size: String,
    #[serde(default)]
    pub two_factor_enabled: bool,
    #[serde(default)]
    pub last_password_change: Option<Timestamp>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            push_notifications_enabled: true,
            email_notifications_enabled: true,
            notification_sounds_enabled: true,
            dark_mode_enabled: false,
            theme: default_theme(),
            font_size: default_font_size(),
            two_factor_enabled: false,
            last_password_change: None,
        }
    }
}

/// A registered account. Email is the authentication key and is unique
/// across the store; `id` never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing)]
    pub password_hash: String,
    #[serde(default)]
    pub profile_picture: String,
    #[serde(default)]
    pub cover_picture: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub residence: String,
    #[serde(default)]
    pub birthdate: Option<Date>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub is_registration_complete: bool,
    #[serde(default)]
    pub friends: Vec<Uuid>,
    #[serde(default)]
    pub preferences: UserPreferences,
    pub created_at: Timestamp,
}

impl User {
    /// Builds a fresh user document with a new id and the current time.
    pub fn new(new_user: NewUser) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: new_user.email,
            username: new_user.username,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            password_hash: new_user.password_hash,
            profile_picture: new_user.profile_picture,
            cover_picture: new_user.cover_picture,
            phone: new_user.phone,
            residence: new_user.residence,
            birthdate: new_user.birthdate,
            bio: String::new(),
            is_registration_complete: new_user.is_registration_complete,
            friends: Vec::new(),
            preferences: UserPreferences::default(),
            created_at: Timestamp::now(),
        }
    }

    pub fn is_friend_with(&self, other: Uuid) -> bool {
        self.friends.contains(&other)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Normalised form used for storage and lookups: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Input for `UserService::create`; the password is already hashed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(alias = "Email")]
    pub email: String,
    #[serde(default, alias = "Username")]
    pub username: String,
    #[serde(default, alias = "FirstName")]
    pub first_name: String,
    #[serde(default, alias = "LastName")]
    pub last_name: String,
    #[serde(default, alias = "PasswordHash")]
    pub password_hash: String,
    #[serde(default, alias = "ProfilePicture")]
    pub profile_picture: String,
    #[serde(default, alias = "CoverPicture")]
    pub cover_picture: String,
    #[serde(default, alias = "Phone")]
    pub phone: String,
    #[serde(default, alias = "Residence")]
    pub residence: String,
    #[serde(default, alias = "Birthdate")]
    pub birthdate: Option<Date>,
    #[serde(default, alias = "IsRegistrationComplete")]
    pub is_registration_complete: bool,
}

/// Self-service registration payload
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    #[serde(alias = "Email")]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[serde(alias = "Password")]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[serde(alias = "FirstName")]
    #[validate(length(min = 2, message = "First name must be at least 2 characters"))]
    pub first_name: String,

    #[serde(alias = "LastName")]
    #[validate(length(min = 2, message = "Last name must be at least 2 characters"))]
    pub last_name: String,

    #[serde(default, alias = "Phone")]
    pub phone: Option<String>,
    #[serde(default, alias = "Residence")]
    pub residence: Option<String>,
    #[serde(default, alias = "Birthdate")]
    pub birthdate: Option<Date>,
}

impl RegisterUser {
    /// Trims the text fields and normalizes the email; validation runs on the result.
    pub fn trimmed(self) -> Self {
        Self {
            email: normalize_email(&self.email),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone: self.phone.map(|p| p.trim().to_string()),
            residence: self.residence.map(|r| r.trim().to_string()),
            ..self
        }
    }
}

/// Profile edit; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default, alias = "FirstName")]
    #[validate(length(min = 2, message = "First name must be at least 2 characters"))]
    pub first_name: Option<String>,
    #[serde(default, alias = "LastName")]
    #[validate(length(min = 2, message = "Last name must be at least 2 characters"))]
    pub last_name: Option<String>,
    #[serde(default, alias = "Phone")]
    pub phone: Option<String>,
    #[serde(default, alias = "Residence")]
    pub residence: Option<String>,
    #[serde(default, alias = "Birthdate")]
    pub birthdate: Option<Date>,
    #[serde(default, alias = "Bio")]
    #[validate(length(max = 1000, message = "Bio must be at most 1000 characters"))]
    pub bio: Option<String>,
}

impl ProfileUpdate {
    pub fn trimmed(self) -> Self {
        let trim = |value: Option<String>| value.map(|v| v.trim().to_string());
        Self {
            first_name: trim(self.first_name),
            last_name: trim(self.last_name),
            phone: trim(self.phone),
            residence: trim(self.residence),
            ..self
        }
    }

    pub fn apply(&self, user: &mut User) {
        if let Some(first_name) = &self.first_name {
            user.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = &self.last_name {
            user.last_name = last_name.trim().to_string();
        }
        if let Some(phone) = &self.phone {
            user.phone = phone.trim().to_string();
        }
        if let Some(residence) = &self.residence {
            user.residence = residence.trim().to_string();
        }
        if self.birthdate.is_some() {
            user.birthdate = self.birthdate;
        }
        if let Some(bio) = &self.bio {
            user.bio = bio.clone();
        }
    }
}

/// Partial settings update; only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    #[serde(default, alias = "PushNotificationsEnabled")]
    pub push_notifications_enabled: Option<bool>,
    #[serde(default, alias = "EmailNotificationsEnabled")]
    pub email_notifications_enabled: Option<bool>,
    #[serde(default, alias = "NotificationSoundsEnabled")]
    pub notification_sounds_enabled: Option<bool>,
    #[serde(default, alias = "DarkModeEnabled")]
    pub dark_mode_enabled: Option<bool>,
    #[serde(default, alias = "Theme")]
    pub theme: Option<String>,
    #[serde(default, alias = "FontSize")]
    pub font_size: Option<String>,
    #[serde(default, alias = "TwoFactorEnabled")]
    pub two_factor_enabled: Option<bool>,
}

impl PreferencesUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply(&self, preferences: &mut UserPreferences) {
        if let Some(value) = self.push_notifications_enabled {
            preferences.push_notifications_enabled = value;
        }
        if let Some(value) = self.email_notifications_enabled {
            preferences.email_notifications_enabled = value;
        }
        if let Some(value) = self.notification_sounds_enabled {
            preferences.notification_sounds_enabled = value;
        }
        if let Some(value) = self.dark_mode_enabled {
            preferences.dark_mode_enabled = value;
        }
        if let Some(value) = &self.theme {
            preferences.theme = value.clone();
        }
        if let Some(value) = &self.font_size {
            preferences.font_size = value.clone();
        }
        if let Some(value) = self.two_factor_enabled {
            preferences.two_factor_enabled = value;
        }
    }
}

/// Display fields copied from a user onto articles and comments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorProfile {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub profile_picture: String,
}

impl From<&User> for AuthorProfile {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            profile_picture: user.profile_picture.clone(),
        }
    }
}

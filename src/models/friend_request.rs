use diesel_derive_enum::DbEnum;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Friend request lifecycle: `Pending` moves once to `Accepted` or `Declined`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, DbEnum)]
#[db_enum(existing_type_path = "crate::schema::sql_types::FriendRequestStatus")]
#[serde(rename_all = "lowercase")]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Declined,
}

impl std::fmt::Display for FriendRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FriendRequestStatus::Pending => write!(f, "pending"),
            FriendRequestStatus::Accepted => write!(f, "accepted"),
            FriendRequestStatus::Declined => write!(f, "declined"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: FriendRequestStatus,
    pub created_at: Timestamp,
    #[serde(default)]
    pub responded_at: Option<Timestamp>,
}

impl FriendRequest {
    pub fn new(sender_id: Uuid, receiver_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            status: FriendRequestStatus::Pending,
            created_at: Timestamp::now(),
            responded_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == FriendRequestStatus::Pending
    }
}

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::constants::MAX_FRIEND_MESSAGE_LEN;
use crate::modules::friend::schema::FriendRequestEntity;

/// Public profile fields shown next to a friend request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub username: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct FriendResponse {
    pub id: Uuid,
    pub name: Option<String>,
    pub username: String,
    pub image: Option<String>,
    pub bio: Option<String>,
}

#[derive(sqlx::FromRow)]
pub struct FriendRequestUserRow {
    pub req_id: Uuid,
    pub user_id: Uuid,
    pub name: Option<String>,
    pub username: String,
    pub image: Option<String>,
    pub req_msg: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl FriendRequestUserRow {
    fn counterpart(&self) -> UserSummary {
        UserSummary {
            id: self.user_id,
            name: self.name.clone(),
            username: self.username.clone(),
            image: self.image.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingFriendRequest {
    pub id: Uuid,
    pub sender: UserSummary,
    pub req_msg: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<FriendRequestUserRow> for IncomingFriendRequest {
    fn from(row: FriendRequestUserRow) -> Self {
        IncomingFriendRequest {
            id: row.req_id,
            sender: row.counterpart(),
            req_msg: row.req_msg,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingFriendRequest {
    pub id: Uuid,
    pub receiver: UserSummary,
    pub req_msg: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<FriendRequestUserRow> for OutgoingFriendRequest {
    fn from(row: FriendRequestUserRow) -> Self {
        OutgoingFriendRequest {
            id: row.req_id,
            receiver: row.counterpart(),
            req_msg: row.req_msg,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    None,
    Pending,
    Received,
    Friends,
}

impl FriendshipStatus {
    pub fn message(&self) -> &'static str {
        match self {
            FriendshipStatus::None => "No friendship status found",
            FriendshipStatus::Pending => "Friend request is pending",
            FriendshipStatus::Received => "Friend request received",
            FriendshipStatus::Friends => "You are friends",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendshipStatusResponse {
    pub status: FriendshipStatus,
    pub message: String,
}

impl From<FriendshipStatus> for FriendshipStatusResponse {
    fn from(status: FriendshipStatus) -> Self {
        FriendshipStatusResponse { status, message: status.message().to_string() }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToggleOutcome {
    Sent,
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleResponse {
    pub outcome: ToggleOutcome,
    pub request: FriendRequestEntity,
}

impl ToggleResponse {
    pub fn message(&self) -> &'static str {
        match self.outcome {
            ToggleOutcome::Sent => "Friend request sent",
            ToggleOutcome::Cancelled => "Friend request removed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    #[serde(alias = "recipientId")]
    pub receiver_id: Uuid,
    #[validate(length(max = MAX_FRIEND_MESSAGE_LEN, message = "Message is too long"))]
    pub message: Option<String>,
}

/// Optional response message for accepting or rejecting a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RespondBody {
    #[validate(length(max = MAX_FRIEND_MESSAGE_LEN, message = "Message is too long"))]
    pub message: Option<String>,
}

/// Blank messages are stored as absent.
pub fn normalize_message(message: Option<String>) -> Option<String> {
    message.map(|m| m.trim().to_string()).filter(|m| !m.is_empty())
}

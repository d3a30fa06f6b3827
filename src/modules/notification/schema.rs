use serde::{Deserialize, Serialize};
use sqlx::prelude::{FromRow, Type};
use uuid::Uuid;

#[allow(unused)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Type, Serialize, Deserialize)]
#[sqlx(type_name = "notification_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    FriendRequest,
    Follow,
    Message,
    Like,
    Comment,
    Post,
}

#[allow(unused)]
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEntity {
    pub id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub _type: NotificationType,
    pub user_id: Uuid,
    pub creator_id: Uuid,
    pub request_id: Option<Uuid>,
    pub message_id: Option<Uuid>,
    pub post_id: Option<Uuid>,
    pub read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub _type: NotificationType,
    pub user_id: Uuid,
    pub creator_id: Uuid,
    pub request_id: Option<Uuid>,
}

impl NewNotification {
    /// A FRIEND_REQUEST notification from `creator_id` to `user_id` tied to a request row.
    pub fn friend_request(user_id: Uuid, creator_id: Uuid, request_id: Uuid) -> Self {
        NewNotification {
            _type: NotificationType::FriendRequest,
            user_id,
            creator_id,
            request_id: Some(request_id),
        }
    }
}

use uuid::Uuid;

use crate::api::error;
use crate::modules::friend::model::{
    FriendResponse, IncomingFriendRequest, OutgoingFriendRequest,
};
use crate::modules::friend::schema::{FriendEntity, FriendRequestEntity};

#[async_trait::async_trait]
pub trait FriendRepository {
    async fn find_friendship(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Option<FriendEntity>, error::SystemError>;

    async fn find_friends(&self, user_id: &Uuid)
    -> Result<Vec<FriendResponse>, error::SystemError>;
}

#[async_trait::async_trait]
pub trait FriendRequestRepository {
    /// Looks up the request for the ordered (sender, receiver) pair.
    async fn find_friend_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError>;

    async fn find_friend_request_by_id(
        &self,
        request_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError>;

    /// Pending requests sent by `user_id`, newest first.
    async fn find_pending_from_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<OutgoingFriendRequest>, error::SystemError>;

    /// Pending requests addressed to `user_id`, newest first.
    async fn find_pending_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<IncomingFriendRequest>, error::SystemError>;
}

/// Multi-row state transitions. Each method commits all of its writes or none.
#[async_trait::async_trait]
pub trait FriendRepo: FriendRepository + FriendRequestRepository + Send + Sync {
    /// Inserts a PENDING request and its notification to the receiver. Fails
    /// with Conflict when the pair already has a row or the receiver has a
    /// pending request toward the sender.
    async fn create_friend_request_atomic(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
        message: &Option<String>,
    ) -> Result<FriendRequestEntity, error::SystemError>;

    /// Moves a settled request back to PENDING with a fresh message and
    /// notifies the receiver again.
    async fn renew_friend_request_atomic(
        &self,
        request_id: &Uuid,
        message: &Option<String>,
    ) -> Result<FriendRequestEntity, error::SystemError>;

    /// Deletes a PENDING request together with every notification linked to it.
    async fn cancel_friend_request_atomic(
        &self,
        request_id: &Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError>;

    /// PENDING -> ACCEPTED, notifies the sender and records the friendship.
    async fn accept_friend_request_atomic(
        &self,
        request_id: &Uuid,
        message: &Option<String>,
    ) -> Result<FriendRequestEntity, error::SystemError>;

    /// PENDING -> REJECTED and notifies the sender.
    async fn reject_friend_request_atomic(
        &self,
        request_id: &Uuid,
        message: &Option<String>,
    ) -> Result<FriendRequestEntity, error::SystemError>;
}

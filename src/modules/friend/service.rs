use log::{debug, info};
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        friend::{
            model::{
                FriendResponse, FriendshipStatus, IncomingFriendRequest, OutgoingFriendRequest,
                ToggleOutcome, ToggleResponse, normalize_message,
            },
            repository::FriendRepo,
            schema::FriendRequestEntity,
        },
        user::repository::UserRepository,
    },
};

#[derive(Clone)]
pub struct FriendService {
    friend_repo: Arc<dyn FriendRepo>,
    user_repo: Arc<dyn UserRepository + Send + Sync>,
}

impl FriendService {
    pub fn with_dependencies(
        friend_repo: Arc<dyn FriendRepo>,
        user_repo: Arc<dyn UserRepository + Send + Sync>,
    ) -> Self {
        info!("FriendService initialized with dependencies");
        FriendService { friend_repo, user_repo }
    }

    pub async fn get_friends(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendResponse>, error::SystemError> {
        self.friend_repo.find_friends(&user_id).await
    }

    pub async fn send_friend_request(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        message: Option<String>,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        if receiver_id == sender_id {
            return Err(error::SystemError::bad_request("Cannot send friend request to yourself"));
        }

        if self.user_repo.find_by_id(&receiver_id).await?.is_none() {
            return Err(error::SystemError::not_found("Receiver user not found"));
        }

        let message = normalize_message(message);

        let (friendship, outgoing, incoming) = tokio::try_join!(
            self.friend_repo.find_friendship(&sender_id, &receiver_id),
            self.friend_repo.find_friend_request(&sender_id, &receiver_id),
            self.friend_repo.find_friend_request(&receiver_id, &sender_id),
        )?;

        if friendship.is_some() {
            return Err(error::SystemError::bad_request("Users are already friends"));
        }

        if incoming.is_some_and(|r| r.is_pending()) {
            return Err(error::SystemError::conflict(
                "This user has already sent you a friend request",
            ));
        }

        let request = match outgoing {
            Some(existing) if existing.is_pending() => {
                return Err(error::SystemError::conflict("Friend request already exists"));
            }
            Some(settled) => {
                self.friend_repo.renew_friend_request_atomic(&settled.id, &message).await?
            }
            None => {
                self.friend_repo
                    .create_friend_request_atomic(&sender_id, &receiver_id, &message)
                    .await?
            }
        };

        info!("Friend request {} sent from {} to {}", request.id, sender_id, receiver_id);
        Ok(request)
    }

    pub async fn cancel_friend_request(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let request = self
            .friend_repo
            .find_friend_request(&sender_id, &receiver_id)
            .await?
            .filter(FriendRequestEntity::is_pending)
            .ok_or_else(|| error::SystemError::not_found("No pending friend request to cancel"))?;

        let request = self.friend_repo.cancel_friend_request_atomic(&request.id).await?;

        info!("Friend request {} cancelled by {}", request.id, sender_id);
        Ok(request)
    }

    /// Cancels the caller's pending request toward `receiver_id` if there is
    /// one, otherwise sends a new request.
    pub async fn toggle_friend_request(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        message: Option<String>,
    ) -> Result<ToggleResponse, error::SystemError> {
        let pending = self
            .friend_repo
            .find_friend_request(&sender_id, &receiver_id)
            .await?
            .is_some_and(|r| r.is_pending());

        if pending {
            let request = self.cancel_friend_request(sender_id, receiver_id).await?;
            Ok(ToggleResponse { outcome: ToggleOutcome::Cancelled, request })
        } else {
            let request = self.send_friend_request(sender_id, receiver_id, message).await?;
            Ok(ToggleResponse { outcome: ToggleOutcome::Sent, request })
        }
    }

    /// Accepts the pending request `counterparty_id` sent to `user_id`.
    pub async fn accept_friend_request(
        &self,
        user_id: Uuid,
        counterparty_id: Uuid,
        message: Option<String>,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let incoming = self.friend_repo.find_friend_request(&counterparty_id, &user_id).await?;
        let request = match incoming {
            Some(request) => request,
            None => {
                let own = self.friend_repo.find_friend_request(&user_id, &counterparty_id).await?;
                return Err(match own {
                    Some(_) => error::SystemError::forbidden(
                        "You are not authorized to accept this request",
                    ),
                    None => error::SystemError::not_found("Friend request not found"),
                });
            }
        };

        self.accept(user_id, request, message).await
    }

    pub async fn accept_friend_request_by_id(
        &self,
        user_id: Uuid,
        request_id: Uuid,
        message: Option<String>,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let request = self
            .friend_repo
            .find_friend_request_by_id(&request_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Friend request not found"))?;

        self.accept(user_id, request, message).await
    }

    async fn accept(
        &self,
        user_id: Uuid,
        request: FriendRequestEntity,
        message: Option<String>,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        if request.receiver_id != user_id {
            return Err(error::SystemError::forbidden(
                "You are not authorized to accept this request",
            ));
        }

        if !request.is_pending() {
            return Err(error::SystemError::bad_request("Friend request is no longer pending"));
        }

        let request = self
            .friend_repo
            .accept_friend_request_atomic(&request.id, &normalize_message(message))
            .await?;

        info!(
            "Friend request {} accepted, {} and {} are friends",
            request.id, request.sender_id, user_id
        );
        Ok(request)
    }

    pub async fn reject_friend_request(
        &self,
        user_id: Uuid,
        request_id: Uuid,
        message: Option<String>,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let request = self
            .friend_repo
            .find_friend_request_by_id(&request_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Friend request not found"))?;

        if request.receiver_id != user_id {
            return Err(error::SystemError::forbidden(
                "You are not authorized to reject this request",
            ));
        }

        if !request.is_pending() {
            return Err(error::SystemError::bad_request("Friend request is no longer pending"));
        }

        let request = self
            .friend_repo
            .reject_friend_request_atomic(&request_id, &normalize_message(message))
            .await?;

        info!("Friend request {} rejected by {}", request.id, user_id);
        Ok(request)
    }

    pub async fn get_incoming_friend_requests(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<IncomingFriendRequest>, error::SystemError> {
        self.friend_repo.find_pending_to_user(&user_id).await
    }

    pub async fn get_outgoing_friend_requests(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<OutgoingFriendRequest>, error::SystemError> {
        self.friend_repo.find_pending_from_user(&user_id).await
    }

    /// Friendship is checked first: an accepted request leaves no pending row.
    pub async fn check_friendship_status(
        &self,
        user_id: Uuid,
        other_id: Uuid,
    ) -> Result<FriendshipStatus, error::SystemError> {
        if user_id == other_id {
            return Ok(FriendshipStatus::None);
        }

        if self.friend_repo.find_friendship(&user_id, &other_id).await?.is_some() {
            return Ok(FriendshipStatus::Friends);
        }

        let (outgoing, incoming) = tokio::try_join!(
            self.friend_repo.find_friend_request(&user_id, &other_id),
            self.friend_repo.find_friend_request(&other_id, &user_id),
        )?;

        let status = if outgoing.is_some_and(|r| r.is_pending()) {
            FriendshipStatus::Pending
        } else if incoming.is_some_and(|r| r.is_pending()) {
            FriendshipStatus::Received
        } else {
            FriendshipStatus::None
        };

        debug!("Friendship status {} -> {}: {:?}", user_id, other_id, status);
        Ok(status)
    }
}

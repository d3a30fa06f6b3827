//! In-memory repositories used by service and handler tests.

use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::api::error;
use crate::modules::friend::{
    model::{FriendResponse, FriendRequestUserRow, IncomingFriendRequest, OutgoingFriendRequest},
    repository::{FriendRepo, FriendRepository, FriendRequestRepository},
    schema::{FriendEntity, FriendRequestEntity, FriendRequestStatus, ordered_pair},
};
use crate::modules::notification::schema::{NewNotification, NotificationEntity};
use crate::modules::user::{model::InsertUser, repository::UserRepository, schema::UserEntity};

#[derive(Default)]
struct State {
    users: Vec<UserEntity>,
    requests: Vec<FriendRequestEntity>,
    friends: Vec<FriendEntity>,
    notifications: Vec<NotificationEntity>,
}

impl State {
    fn user(&self, id: &Uuid) -> Option<&UserEntity> {
        self.users.iter().find(|u| u.id == *id)
    }

    fn request_mut(&mut self, id: &Uuid) -> Option<&mut FriendRequestEntity> {
        self.requests.iter_mut().find(|r| r.id == *id)
    }

    fn notify(&mut self, new: NewNotification) {
        self.notifications.push(NotificationEntity {
            id: Uuid::now_v7(),
            _type: new._type,
            user_id: new.user_id,
            creator_id: new.creator_id,
            request_id: new.request_id,
            message_id: None,
            post_id: None,
            read: false,
            created_at: chrono::Utc::now(),
        });
    }

    fn request_rows(
        &self,
        matches: impl Fn(&FriendRequestEntity) -> bool,
        counterpart: impl Fn(&FriendRequestEntity) -> Uuid,
    ) -> Vec<FriendRequestUserRow> {
        let mut pending: Vec<&FriendRequestEntity> =
            self.requests.iter().filter(|r| r.is_pending() && matches(r)).collect();
        pending.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        pending
            .into_iter()
            .filter_map(|r| {
                let user = self.user(&counterpart(r))?;
                Some(FriendRequestUserRow {
                    req_id: r.id,
                    user_id: user.id,
                    name: user.name.clone(),
                    username: user.username.clone(),
                    image: user.image.clone(),
                    req_msg: r.req_msg.clone(),
                    created_at: r.created_at,
                })
            })
            .collect()
    }
}

/// Shared in-memory store implementing every repository trait. Clones see
/// the same data. Each trait method holds the lock for its whole body, which
/// makes the multi-row operations atomic.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn user_repo(&self) -> Self {
        self.clone()
    }

    pub fn seed_user(&self, username: &str) -> UserEntity {
        let user = UserEntity {
            id: Uuid::now_v7(),
            external_id: format!("idp|{username}"),
            name: Some(username.to_uppercase()),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            image: None,
            bio: Some(format!("{username}'s bio")),
            created_at: chrono::Utc::now(),
        };
        self.lock().users.push(user.clone());
        user
    }

    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    pub fn requests(&self) -> Vec<FriendRequestEntity> {
        self.lock().requests.clone()
    }

    pub fn notifications(&self) -> Vec<NotificationEntity> {
        self.lock().notifications.clone()
    }

    pub fn friendships(&self) -> Vec<FriendEntity> {
        self.lock().friends.clone()
    }
}

#[async_trait::async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self.lock().user(id).cloned())
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self.lock().users.iter().find(|u| u.external_id == external_id).cloned())
    }

    async fn create(&self, user: &InsertUser) -> Result<UserEntity, error::SystemError> {
        let mut state = self.lock();
        if state.users.iter().any(|u| u.external_id == user.external_id) {
            return Err(error::SystemError::conflict("User already exists"));
        }
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(error::SystemError::conflict("Username already exists"));
        }
        let entity = UserEntity {
            id: Uuid::now_v7(),
            external_id: user.external_id.clone(),
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            image: user.image.clone(),
            bio: None,
            created_at: chrono::Utc::now(),
        };
        state.users.push(entity.clone());
        Ok(entity)
    }
}

#[async_trait::async_trait]
impl FriendRepository for MemoryStore {
    async fn find_friendship(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Option<FriendEntity>, error::SystemError> {
        let (a, b) = ordered_pair(*user_id_a, *user_id_b);
        Ok(self.lock().friends.iter().find(|f| f.user_a == a && f.user_b == b).cloned())
    }

    async fn find_friends(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendResponse>, error::SystemError> {
        let state = self.lock();
        let mut friendships: Vec<&FriendEntity> =
            state.friends.iter().filter(|f| f.user_a == *user_id || f.user_b == *user_id).collect();
        friendships.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(friendships
            .into_iter()
            .filter_map(|f| {
                let other = if f.user_a == *user_id { f.user_b } else { f.user_a };
                state.user(&other).map(|u| FriendResponse {
                    id: u.id,
                    name: u.name.clone(),
                    username: u.username.clone(),
                    image: u.image.clone(),
                    bio: u.bio.clone(),
                })
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl FriendRequestRepository for MemoryStore {
    async fn find_friend_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        Ok(self
            .lock()
            .requests
            .iter()
            .find(|r| r.sender_id == *sender_id && r.receiver_id == *receiver_id)
            .cloned())
    }

    async fn find_friend_request_by_id(
        &self,
        request_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        Ok(self.lock().requests.iter().find(|r| r.id == *request_id).cloned())
    }

    async fn find_pending_from_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<OutgoingFriendRequest>, error::SystemError> {
        let rows = self.lock().request_rows(|r| r.sender_id == *user_id, |r| r.receiver_id);
        Ok(rows.into_iter().map(OutgoingFriendRequest::from).collect())
    }

    async fn find_pending_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<IncomingFriendRequest>, error::SystemError> {
        let rows = self.lock().request_rows(|r| r.receiver_id == *user_id, |r| r.sender_id);
        Ok(rows.into_iter().map(IncomingFriendRequest::from).collect())
    }
}

#[async_trait::async_trait]
impl FriendRepo for MemoryStore {
    async fn create_friend_request_atomic(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
        message: &Option<String>,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let mut state = self.lock();

        let reverse_pending = state.requests.iter().any(|r| {
            r.sender_id == *receiver_id && r.receiver_id == *sender_id && r.is_pending()
        });
        if reverse_pending {
            return Err(error::SystemError::conflict(
                "This user has already sent you a friend request",
            ));
        }
        if state.requests.iter().any(|r| r.sender_id == *sender_id && r.receiver_id == *receiver_id)
        {
            return Err(error::SystemError::conflict("Friend request already exists"));
        }

        let request = FriendRequestEntity {
            id: Uuid::now_v7(),
            sender_id: *sender_id,
            receiver_id: *receiver_id,
            status: FriendRequestStatus::Pending,
            req_msg: message.clone(),
            res_msg: None,
            created_at: chrono::Utc::now(),
        };
        state.requests.push(request.clone());
        state.notify(NewNotification::friend_request(*receiver_id, *sender_id, request.id));

        Ok(request)
    }

    async fn renew_friend_request_atomic(
        &self,
        request_id: &Uuid,
        message: &Option<String>,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let mut state = self.lock();

        let (sender_id, receiver_id) = state
            .requests
            .iter()
            .find(|r| r.id == *request_id)
            .map(|r| (r.sender_id, r.receiver_id))
            .ok_or_else(|| error::SystemError::not_found("Friend request not found"))?;
        let reverse_pending = state.requests.iter().any(|r| {
            r.sender_id == receiver_id && r.receiver_id == sender_id && r.is_pending()
        });
        if reverse_pending {
            return Err(error::SystemError::conflict(
                "This user has already sent you a friend request",
            ));
        }

        let request = state
            .request_mut(request_id)
            .filter(|r| !r.is_pending())
            .ok_or_else(|| error::SystemError::conflict("Friend request already exists"))?;
        request.status = FriendRequestStatus::Pending;
        request.req_msg = message.clone();
        request.res_msg = None;
        request.created_at = chrono::Utc::now();
        let request = request.clone();

        state.notify(NewNotification::friend_request(
            request.receiver_id,
            request.sender_id,
            request.id,
        ));

        Ok(request)
    }

    async fn cancel_friend_request_atomic(
        &self,
        request_id: &Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let mut state = self.lock();

        let idx = state
            .requests
            .iter()
            .position(|r| r.id == *request_id && r.is_pending())
            .ok_or_else(|| error::SystemError::not_found("No pending friend request to cancel"))?;
        let request = state.requests.remove(idx);
        state.notifications.retain(|n| n.request_id != Some(request.id));

        Ok(request)
    }

    async fn accept_friend_request_atomic(
        &self,
        request_id: &Uuid,
        message: &Option<String>,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let mut state = self.lock();

        let request = state
            .request_mut(request_id)
            .filter(|r| r.is_pending())
            .ok_or_else(|| error::SystemError::bad_request("Friend request is no longer pending"))?;
        request.status = FriendRequestStatus::Accepted;
        request.res_msg = message.clone();
        let request = request.clone();

        state.notify(NewNotification::friend_request(
            request.sender_id,
            request.receiver_id,
            request.id,
        ));

        let (user_a, user_b) = ordered_pair(request.sender_id, request.receiver_id);
        if !state.friends.iter().any(|f| f.user_a == user_a && f.user_b == user_b) {
            state.friends.push(FriendEntity { user_a, user_b, created_at: chrono::Utc::now() });
        }

        Ok(request)
    }

    async fn reject_friend_request_atomic(
        &self,
        request_id: &Uuid,
        message: &Option<String>,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let mut state = self.lock();

        let request = state
            .request_mut(request_id)
            .filter(|r| r.is_pending())
            .ok_or_else(|| error::SystemError::bad_request("Friend request is no longer pending"))?;
        request.status = FriendRequestStatus::Rejected;
        request.res_msg = message.clone();
        let request = request.clone();

        state.notify(NewNotification::friend_request(
            request.sender_id,
            request.receiver_id,
            request.id,
        ));

        Ok(request)
    }
}

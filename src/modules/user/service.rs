use log::{debug, info};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::modules::user::model::{InsertUser, UserResponse, suffixed_username};
use crate::modules::user::repository::UserRepository;
use crate::utils::Claims;

const USERNAME_ATTEMPTS: usize = 4;

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository + Send + Sync>,
}

impl UserService {
    pub fn with_dependencies(repo: Arc<dyn UserRepository + Send + Sync>) -> Self {
        info!("UserService initialized with dependencies");
        UserService { repo }
    }

    /// Maps identity-provider claims to the internal user id, if the caller
    /// has been synced.
    pub async fn resolve_actor(&self, claims: &Claims) -> Result<Option<Uuid>, error::SystemError> {
        let user = self.repo.find_by_external_id(&claims.sub).await?;
        Ok(user.map(|u| u.id))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<UserResponse, error::SystemError> {
        self.repo
            .find_by_id(&id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| error::SystemError::not_found("User not found"))
    }

    pub async fn sync_user(&self, claims: &Claims) -> Result<UserResponse, error::SystemError> {
        if let Some(existing) = self.repo.find_by_external_id(&claims.sub).await? {
            return Ok(UserResponse::from(existing));
        }

        let mut new_user = InsertUser::from_claims(claims)
            .ok_or_else(|| error::SystemError::bad_request("Identity token carries no email"))?;
        let base_username = new_user.username.clone();

        for _ in 0..USERNAME_ATTEMPTS {
            match self.repo.create(&new_user).await {
                Ok(user) => {
                    info!("User {} synced from identity {}", user.id, claims.sub);
                    return Ok(UserResponse::from(user));
                }
                Err(error::SystemError::Conflict(msg)) => {
                    // a concurrent sync for the same identity won the insert
                    if let Some(existing) = self.repo.find_by_external_id(&claims.sub).await? {
                        return Ok(UserResponse::from(existing));
                    }
                    debug!("Username {} is taken ({msg}), retrying", new_user.username);
                    new_user.username = suffixed_username(&base_username);
                }
                Err(e) => return Err(e),
            }
        }

        Err(error::SystemError::conflict("Username already exists"))
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::user::schema::UserEntity;
use crate::utils::Claims;

pub struct InsertUser {
    pub external_id: String,
    pub name: Option<String>,
    pub username: String,
    pub email: String,
    pub image: Option<String>,
}

impl InsertUser {
    /// Builds the local row for a first-time caller, or `None` when the
    /// claims carry no email to derive a username from.
    pub fn from_claims(claims: &Claims) -> Option<Self> {
        let email = claims.email.clone()?;
        let username = match claims.username.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => email.split('@').next().unwrap_or_default().to_string(),
        };
        let name = claims
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Some(InsertUser {
            external_id: claims.sub.clone(),
            name,
            username,
            email,
            image: claims.picture.clone(),
        })
    }
}

/// `base` plus a short random tail, for when the derived username is taken.
pub fn suffixed_username(base: &str) -> String {
    let tail = Uuid::now_v7().simple().to_string();
    format!("{base}_{}", &tail[tail.len() - 6..])
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: Option<String>,
    pub username: String,
    pub email: String,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<UserEntity> for UserResponse {
    fn from(entity: UserEntity) -> Self {
        UserResponse {
            id: entity.id,
            name: entity.name,
            username: entity.username,
            email: entity.email,
            image: entity.image,
            bio: entity.bio,
            created_at: entity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_user_prefers_username_claim() {
        let claims = Claims::new("idp|1", 60).with_profile(
            Some("alice@example.com"),
            Some("  Alice Doe "),
            Some("alice"),
        );
        let user = InsertUser::from_claims(&claims).unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.name.as_deref(), Some("Alice Doe"));
        assert_eq!(user.external_id, "idp|1");
    }

    #[test]
    fn test_insert_user_falls_back_to_email_local_part() {
        let claims = Claims::new("idp|2", 60).with_profile(Some("bob.smith@example.com"), None, None);
        let user = InsertUser::from_claims(&claims).unwrap();
        assert_eq!(user.username, "bob.smith");
        assert!(user.name.is_none());
    }

    #[test]
    fn test_insert_user_requires_email() {
        let claims = Claims::new("idp|3", 60);
        assert!(InsertUser::from_claims(&claims).is_none());
    }
}

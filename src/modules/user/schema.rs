use sqlx::prelude::FromRow;
use uuid::Uuid;

#[allow(unused)]
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub external_id: String,
    pub name: Option<String>,
    pub username: String,
    pub email: String,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

use uuid::Uuid;

use crate::{
    api::error, modules::user::model::InsertUser, modules::user::schema::UserEntity,
};

#[async_trait::async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError>;
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<UserEntity>, error::SystemError>;
    async fn create(&self, user: &InsertUser) -> Result<UserEntity, error::SystemError>;
}

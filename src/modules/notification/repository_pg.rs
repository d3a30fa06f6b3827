use uuid::Uuid;

use crate::{
    api::error,
    modules::notification::schema::{NewNotification, NotificationEntity},
};

/// Notifications are only ever written as part of another feature's
/// transaction, so every method takes the executor to run on.
#[derive(Clone, Default)]
pub struct NotificationPgRepository;

impl NotificationPgRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        notification: &NewNotification,
        tx: E,
    ) -> Result<NotificationEntity, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let id = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
        let notification = sqlx::query_as::<_, NotificationEntity>(
            r#"
            INSERT INTO notifications (id, type, user_id, creator_id, request_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(notification._type)
        .bind(notification.user_id)
        .bind(notification.creator_id)
        .bind(notification.request_id)
        .fetch_one(tx)
        .await?;

        Ok(notification)
    }

    pub async fn delete_by_request<'e, E>(
        &self,
        request_id: &Uuid,
        tx: E,
    ) -> Result<u64, error::SystemError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let rows = sqlx::query("DELETE FROM notifications WHERE request_id = $1")
            .bind(request_id)
            .execute(tx)
            .await?
            .rows_affected();

        Ok(rows)
    }
}

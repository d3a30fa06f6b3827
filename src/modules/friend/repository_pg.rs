use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        friend::{
            model::{
                FriendRequestUserRow, FriendResponse, IncomingFriendRequest,
                OutgoingFriendRequest,
            },
            repository::{FriendRepo, FriendRepository, FriendRequestRepository},
            schema::{FriendEntity, FriendRequestEntity, ordered_pair},
        },
        notification::{repository_pg::NotificationPgRepository, schema::NewNotification},
    },
};

#[derive(Clone)]
pub struct FriendRepositoryPg {
    pool: sqlx::PgPool,
    notification_repo: NotificationPgRepository,
}

impl FriendRepositoryPg {
    pub fn new(pool: sqlx::PgPool, notification_repo: NotificationPgRepository) -> Self {
        Self { pool, notification_repo }
    }
}

#[async_trait::async_trait]
impl FriendRepository for FriendRepositoryPg {
    async fn find_friendship(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Option<FriendEntity>, error::SystemError> {
        let (user_a, user_b) = ordered_pair(*user_id_a, *user_id_b);

        let friendship = sqlx::query_as::<_, FriendEntity>(
            "SELECT * FROM friends WHERE user_a = $1 AND user_b = $2",
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_optional(&self.pool)
        .await?;

        Ok(friendship)
    }

    async fn find_friends(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendResponse>, error::SystemError> {
        let friends = sqlx::query_as::<_, FriendResponse>(
            r#"
        SELECT
            u.id,
            u.name,
            u.username,
            u.image,
            u.bio
        FROM friends f
        JOIN users u
            ON u.id = CASE
                WHEN f.user_a = $1 THEN f.user_b
                ELSE f.user_a
            END
        WHERE f.user_a = $1
           OR f.user_b = $1
        ORDER BY f.created_at DESC
        "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(friends)
    }
}

#[async_trait::async_trait]
impl FriendRequestRepository for FriendRepositoryPg {
    async fn find_friend_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            "SELECT * FROM friend_requests WHERE sender_id = $1 AND receiver_id = $2",
        )
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn find_friend_request_by_id(
        &self,
        request_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        let request =
            sqlx::query_as::<_, FriendRequestEntity>("SELECT * FROM friend_requests WHERE id = $1")
                .bind(request_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(request)
    }

    async fn find_pending_from_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<OutgoingFriendRequest>, error::SystemError> {
        let rows = sqlx::query_as::<_, FriendRequestUserRow>(
            r#"
            SELECT
                fr.id AS req_id,
                u.id AS user_id,
                u.name,
                u.username,
                u.image,
                fr.req_msg,
                fr.created_at
            FROM friend_requests fr
            JOIN users u
                ON fr.receiver_id = u.id
            WHERE fr.sender_id = $1
              AND fr.status = 'PENDING'
            ORDER BY fr.created_at DESC, fr.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OutgoingFriendRequest::from).collect())
    }

    async fn find_pending_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<IncomingFriendRequest>, error::SystemError> {
        let rows = sqlx::query_as::<_, FriendRequestUserRow>(
            r#"
            SELECT
                fr.id AS req_id,
                u.id AS user_id,
                u.name,
                u.username,
                u.image,
                fr.req_msg,
                fr.created_at
            FROM friend_requests fr
            JOIN users u
                ON fr.sender_id = u.id
            WHERE fr.receiver_id = $1
              AND fr.status = 'PENDING'
            ORDER BY fr.created_at DESC, fr.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(IncomingFriendRequest::from).collect())
    }
}

#[async_trait::async_trait]
impl FriendRepo for FriendRepositoryPg {
    async fn create_friend_request_atomic(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
        message: &Option<String>,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        lock_pair(&mut tx, sender_id, receiver_id).await?;

        if reverse_pending(&mut tx, sender_id, receiver_id).await? {
            tx.rollback().await?;
            return Err(error::SystemError::conflict(
                "This user has already sent you a friend request",
            ));
        }

        let id = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            INSERT INTO friend_requests (id, sender_id, receiver_id, req_msg)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(sender_id)
        .bind(receiver_id)
        .bind(message)
        .fetch_one(&mut *tx)
        .await?;

        self.notification_repo
            .create(&NewNotification::friend_request(*receiver_id, *sender_id, request.id), &mut *tx)
            .await?;

        tx.commit().await?;

        Ok(request)
    }

    async fn renew_friend_request_atomic(
        &self,
        request_id: &Uuid,
        message: &Option<String>,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, FriendRequestEntity>(
            "SELECT * FROM friend_requests WHERE id = $1",
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(existing) = existing else {
            tx.rollback().await?;
            return Err(error::SystemError::not_found("Friend request not found"));
        };

        lock_pair(&mut tx, &existing.sender_id, &existing.receiver_id).await?;

        if reverse_pending(&mut tx, &existing.sender_id, &existing.receiver_id).await? {
            tx.rollback().await?;
            return Err(error::SystemError::conflict(
                "This user has already sent you a friend request",
            ));
        }

        let request = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            UPDATE friend_requests
            SET status = 'PENDING', req_msg = $2, res_msg = NULL, created_at = NOW()
            WHERE id = $1 AND status <> 'PENDING'
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(message)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| error::SystemError::conflict("Friend request already exists"))?;

        self.notification_repo
            .create(
                &NewNotification::friend_request(request.receiver_id, request.sender_id, request.id),
                &mut *tx,
            )
            .await?;

        tx.commit().await?;

        Ok(request)
    }

    async fn cancel_friend_request_atomic(
        &self,
        request_id: &Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        self.notification_repo.delete_by_request(request_id, &mut *tx).await?;

        let request = sqlx::query_as::<_, FriendRequestEntity>(
            "DELETE FROM friend_requests WHERE id = $1 AND status = 'PENDING' RETURNING *",
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(request) = request else {
            tx.rollback().await?;
            return Err(error::SystemError::not_found("No pending friend request to cancel"));
        };

        tx.commit().await?;

        Ok(request)
    }

    async fn accept_friend_request_atomic(
        &self,
        request_id: &Uuid,
        message: &Option<String>,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            UPDATE friend_requests
            SET status = 'ACCEPTED', res_msg = $2
            WHERE id = $1 AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(message)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(request) = request else {
            tx.rollback().await?;
            return Err(error::SystemError::bad_request("Friend request is no longer pending"));
        };

        self.notification_repo
            .create(
                &NewNotification::friend_request(request.sender_id, request.receiver_id, request.id),
                &mut *tx,
            )
            .await?;

        let (u1, u2) = ordered_pair(request.sender_id, request.receiver_id);

        sqlx::query(
            "INSERT INTO friends (user_a, user_b) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(u1)
        .bind(u2)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(request)
    }

    async fn reject_friend_request_atomic(
        &self,
        request_id: &Uuid,
        message: &Option<String>,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            UPDATE friend_requests
            SET status = 'REJECTED', res_msg = $2
            WHERE id = $1 AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(message)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(request) = request else {
            tx.rollback().await?;
            return Err(error::SystemError::bad_request("Friend request is no longer pending"));
        };

        self.notification_repo
            .create(
                &NewNotification::friend_request(request.sender_id, request.receiver_id, request.id),
                &mut *tx,
            )
            .await?;

        tx.commit().await?;

        Ok(request)
    }
}

/// Serializes writers on the unordered pair so that A->B and B->A cannot
/// both become pending.
async fn lock_pair(
    conn: &mut PgConnection,
    sender_id: &Uuid,
    receiver_id: &Uuid,
) -> Result<(), error::SystemError> {
    let (user_a, user_b) = ordered_pair(*sender_id, *receiver_id);
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text || ':' || $2::text, 0))")
        .bind(user_a)
        .bind(user_b)
        .execute(conn)
        .await?;
    Ok(())
}

async fn reverse_pending(
    conn: &mut PgConnection,
    sender_id: &Uuid,
    receiver_id: &Uuid,
) -> Result<bool, error::SystemError> {
    let exists = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM friend_requests
            WHERE sender_id = $1 AND receiver_id = $2 AND status = 'PENDING'
        )
        "#,
    )
    .bind(receiver_id)
    .bind(sender_id)
    .fetch_one(conn)
    .await?;
    Ok(exists)
}

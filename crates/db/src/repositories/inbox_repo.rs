//! Repository for the `inbox_messages` table.

use crewline_core::types::DbId;
use sqlx::PgPool;

pub struct InboxRepo;

impl InboxRepo {
    /// Append an unread inbox message and return its generated ID.
    pub async fn append(
        pool: &PgPool,
        user_id: DbId,
        notification_id: DbId,
        text: &str,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO inbox_messages (id, user_id, notification_id, text) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(uuid::Uuid::now_v7())
        .bind(user_id)
        .bind(notification_id)
        .bind(text)
        .fetch_one(pool)
        .await
    }
}

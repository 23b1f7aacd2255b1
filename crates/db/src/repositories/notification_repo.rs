//! Repository for the `notifications` table.

use crewline_core::notification::{DeliveryOutcome, NewNotification, NotificationRequest};
use crewline_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::notification::NotificationRow;

/// Column list for `notifications` queries.
const COLUMNS: &str = "\
    id, user_id, template_key, channels, payload, schedule_at, dedupe_key, \
    priority_high, status, attempts, results, last_error, provider_message_id, \
    sent_at, created_at, updated_at";

/// Provides persistence for notification requests.
///
/// Every status-changing update is conditional on `status = 'scheduled'` so
/// concurrent workers cannot overwrite each other's terminal state.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Find a notification request by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<NotificationRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notifications WHERE id = $1");
        let row = sqlx::query_as::<_, NotificationRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        row.map(into_request).transpose()
    }

    /// Whether any request (in any status) already carries `dedupe_key`.
    pub async fn dedupe_key_exists(pool: &PgPool, dedupe_key: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM notifications WHERE dedupe_key = $1)",
        )
        .bind(dedupe_key)
        .fetch_one(pool)
        .await
    }

    /// Insert a batch of new requests in one transaction.
    ///
    /// Rows whose dedupe key is already taken are skipped. Returns the IDs
    /// actually inserted, in input order.
    pub async fn create_batch(
        pool: &PgPool,
        batch: &[NewNotification],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = pool.begin().await?;
        let mut inserted = Vec::with_capacity(batch.len());
        for new in batch {
            let channels = serde_json::to_value(&new.channels)
                .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
            let id: Option<DbId> = sqlx::query_scalar(
                "INSERT INTO notifications \
                    (id, user_id, template_key, channels, payload, schedule_at, dedupe_key, priority_high) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                 ON CONFLICT (dedupe_key) WHERE dedupe_key IS NOT NULL DO NOTHING \
                 RETURNING id",
            )
            .bind(new.id)
            .bind(new.user_id)
            .bind(&new.template_key)
            .bind(channels)
            .bind(serde_json::Value::Object(new.payload.clone()))
            .bind(new.schedule_at)
            .bind(new.dedupe_key.as_deref())
            .bind(new.priority_high)
            .fetch_optional(&mut *tx)
            .await?;
            match id {
                Some(id) => inserted.push(id),
                None => tracing::debug!(
                    dedupe_key = new.dedupe_key.as_deref().unwrap_or_default(),
                    "Dedupe key already taken, skipping insert"
                ),
            }
        }
        tx.commit().await?;
        Ok(inserted)
    }

    /// Move a scheduled request to `skipped_quiet_hours`.
    ///
    /// Returns `false` if the request was no longer scheduled.
    pub async fn mark_skipped_quiet_hours(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET status = 'skipped_quiet_hours', updated_at = NOW() \
             WHERE id = $1 AND status = 'scheduled'",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a scheduled request `failed` because its template is missing.
    pub async fn mark_template_missing(
        pool: &PgPool,
        id: DbId,
        template_key: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET status = 'failed', last_error = $2, updated_at = NOW() \
             WHERE id = $1 AND status = 'scheduled'",
        )
        .bind(id)
        .bind(format!("Template {template_key} not found."))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Persist the terminal outcome of a delivery attempt.
    ///
    /// Increments `attempts` and stamps `sent_at`. Returns `false` if
    /// another worker finalised the request first.
    pub async fn record_delivery(
        pool: &PgPool,
        id: DbId,
        outcome: &DeliveryOutcome,
    ) -> Result<bool, sqlx::Error> {
        let results = serde_json::to_value(&outcome.results)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        let result = sqlx::query(
            "UPDATE notifications \
             SET status = $2, results = $3, last_error = $4, provider_message_id = $5, \
                 attempts = attempts + 1, sent_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = 'scheduled'",
        )
        .bind(id)
        .bind(outcome.status.as_str())
        .bind(results)
        .bind(outcome.last_error.as_deref())
        .bind(outcome.provider_message_id.as_deref())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Scheduled requests whose `schedule_at` is unset or not after `now`,
    /// oldest first.
    pub async fn list_due(
        pool: &PgPool,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT id FROM notifications \
             WHERE status = 'scheduled' AND (schedule_at IS NULL OR schedule_at <= $1) \
             ORDER BY COALESCE(schedule_at, created_at) ASC \
             LIMIT $2",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}

fn into_request(row: NotificationRow) -> Result<NotificationRequest, sqlx::Error> {
    NotificationRequest::try_from(row).map_err(sqlx::Error::Decode)
}

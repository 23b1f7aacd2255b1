//! Repository for the append-only `audit_logs` table.

use sqlx::PgPool;

use crate::models::audit::{AuditLog, CreateAuditLog};

const COLUMNS: &str = "id, action_type, entity_type, entity_id, details_json, created_at";

pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Insert one audit entry and return the stored row.
    pub async fn insert(pool: &PgPool, entry: &CreateAuditLog) -> Result<AuditLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO audit_logs (action_type, entity_type, entity_id, details_json) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(&entry.action_type)
            .bind(entry.entity_type.as_deref())
            .bind(entry.entity_id)
            .bind(entry.details_json.as_ref())
            .fetch_one(pool)
            .await
    }
}

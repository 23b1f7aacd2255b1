//! Repository for the `users` table (read-only for the notification pipeline).

use crewline_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::User;

/// Column list for `users` queries.
const COLUMNS: &str = "\
    id, display_name, role, email, phone, whatsapp_opt_in, timezone, \
    supervisor_id, notify_prefs, is_active, created_at, updated_at";

pub struct UserRepo;

impl UserRepo {
    /// Find a user by ID, active or not.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Active users holding any of `roles`, ordered by display name.
    pub async fn list_active_by_roles(
        pool: &PgPool,
        roles: &[&str],
    ) -> Result<Vec<User>, sqlx::Error> {
        let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
        let query = format!(
            "SELECT {COLUMNS} FROM users \
             WHERE is_active AND role = ANY($1) \
             ORDER BY display_name ASC"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(roles)
            .fetch_all(pool)
            .await
    }
}

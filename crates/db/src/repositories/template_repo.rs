//! Repository for the `notification_templates` table.

use sqlx::PgPool;

use crate::models::template::NotificationTemplate;

const COLUMNS: &str = "key, subject, email_html, inapp_text, whatsapp_body, created_at, updated_at";

pub struct TemplateRepo;

impl TemplateRepo {
    /// Find a template by its key.
    pub async fn find_by_key(
        pool: &PgPool,
        key: &str,
    ) -> Result<Option<NotificationTemplate>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notification_templates WHERE key = $1");
        sqlx::query_as::<_, NotificationTemplate>(&query)
            .bind(key)
            .fetch_optional(pool)
            .await
    }
}

//! Notification template model.

use crewline_core::template::TemplateContent;
use crewline_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notification_templates` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationTemplate {
    pub key: String,
    pub subject: String,
    pub email_html: String,
    pub inapp_text: String,
    pub whatsapp_body: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<NotificationTemplate> for TemplateContent {
    fn from(row: NotificationTemplate) -> Self {
        Self {
            subject: row.subject,
            email_html: row.email_html,
            inapp_text: row.inapp_text,
            whatsapp_body: row.whatsapp_body,
        }
    }
}

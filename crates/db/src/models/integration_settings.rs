//! Integration settings model (single-row table).

use crewline_core::settings::IntegrationSettings;
use crewline_core::types::Timestamp;
use sqlx::FromRow;

/// The `integration_settings` row. `smtp` and `whatsapp` are JSONB documents
/// matching [`crewline_core::settings::SmtpSettings`] and
/// [`crewline_core::settings::WhatsAppSettings`].
#[derive(Debug, Clone, FromRow)]
pub struct IntegrationSettingsRow {
    pub smtp: serde_json::Value,
    pub whatsapp: serde_json::Value,
    pub updated_at: Timestamp,
}

impl TryFrom<IntegrationSettingsRow> for IntegrationSettings {
    type Error = serde_json::Error;

    fn try_from(row: IntegrationSettingsRow) -> Result<Self, Self::Error> {
        Ok(Self {
            smtp: serde_json::from_value(row.smtp)?,
            whatsapp: serde_json::from_value(row.whatsapp)?,
        })
    }
}

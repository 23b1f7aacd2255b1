//! Repository for the single-row `integration_settings` table.

use crewline_core::settings::IntegrationSettings;
use sqlx::PgPool;

use crate::models::integration_settings::IntegrationSettingsRow;

pub struct IntegrationSettingsRepo;

impl IntegrationSettingsRepo {
    /// Current integration settings.
    ///
    /// A missing row yields the defaults (every integration disabled).
    pub async fn get(pool: &PgPool) -> Result<IntegrationSettings, sqlx::Error> {
        let row = sqlx::query_as::<_, IntegrationSettingsRow>(
            "SELECT smtp, whatsapp, updated_at FROM integration_settings WHERE id = 1",
        )
        .fetch_optional(pool)
        .await?;
        match row {
            Some(row) => {
                IntegrationSettings::try_from(row).map_err(|e| sqlx::Error::Decode(Box::new(e)))
            }
            None => Ok(IntegrationSettings::default()),
        }
    }
}

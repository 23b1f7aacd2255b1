//! User entity model.

use crewline_core::recipient::{NotifyPrefs, Recipient};
use crewline_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub display_name: String,
    pub role: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub whatsapp_opt_in: bool,
    pub timezone: Option<String>,
    pub supervisor_id: Option<DbId>,
    pub notify_prefs: serde_json::Value,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Convert to the pipeline's contact profile.
    ///
    /// A malformed `notify_prefs` document is logged and replaced by the
    /// defaults (all channels on, no quiet hours) rather than failing the
    /// caller.
    pub fn into_recipient(self) -> Recipient {
        let notify_prefs = match serde_json::from_value::<NotifyPrefs>(self.notify_prefs) {
            Ok(prefs) => prefs,
            Err(e) => {
                tracing::warn!(user_id = %self.id, error = %e, "Malformed notify_prefs, using defaults");
                NotifyPrefs::default()
            }
        };
        Recipient {
            id: self.id,
            display_name: self.display_name,
            role: self.role,
            email: self.email,
            phone: self.phone,
            whatsapp_opt_in: self.whatsapp_opt_in,
            timezone: self.timezone,
            supervisor_id: self.supervisor_id,
            notify_prefs,
        }
    }
}

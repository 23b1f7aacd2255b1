//! Recipient contact profile as seen by the notification pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::channels::{Category, Channel};
use crate::quiet_hours::QuietHoursWindow;
use crate::types::DbId;

/// Per-user notification preferences (`users.notify_prefs`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotifyPrefs {
    /// Do-not-disturb window local to the user's timezone.
    #[serde(default, alias = "quietHours")]
    pub quiet_hours: Option<QuietHoursWindow>,

    /// `category -> channel -> enabled`. Missing entries mean "use the
    /// policy default". Channel keys are kept as raw strings so that legacy
    /// spellings still resolve through [`Channel::from_name`].
    #[serde(default)]
    pub channels: BTreeMap<String, BTreeMap<String, bool>>,
}

impl NotifyPrefs {
    /// The explicit preference for `(category, channel)`, if any.
    pub fn channel_setting(&self, category: Category, channel: Channel) -> Option<bool> {
        self.channels
            .get(category.as_str())?
            .iter()
            .find(|(name, _)| Channel::from_name(name).ok() == Some(channel))
            .map(|(_, enabled)| *enabled)
    }
}

/// Read-only view of a user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: DbId,
    pub display_name: String,
    pub role: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub whatsapp_opt_in: bool,
    /// IANA timezone name, e.g. `"America/New_York"`.
    pub timezone: Option<String>,
    pub supervisor_id: Option<DbId>,
    pub notify_prefs: NotifyPrefs,
}

impl Recipient {
    /// Contact profile with no details, used when the user record is missing.
    pub fn empty(id: DbId) -> Self {
        Self {
            id,
            display_name: String::new(),
            role: String::new(),
            email: None,
            phone: None,
            whatsapp_opt_in: false,
            timezone: None,
            supervisor_id: None,
            notify_prefs: NotifyPrefs::default(),
        }
    }

    /// Email address, if present and non-blank.
    pub fn email_address(&self) -> Option<&str> {
        non_blank(self.email.as_deref())
    }

    /// Phone number, if present and non-blank.
    pub fn phone_number(&self) -> Option<&str> {
        non_blank(self.phone.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_contact_details_are_treated_as_missing() {
        let mut r = Recipient::empty(DbId::nil());
        r.email = Some("   ".into());
        r.phone = Some("".into());
        assert!(r.email_address().is_none());
        assert!(r.phone_number().is_none());

        r.email = Some(" ana@example.com ".into());
        assert_eq!(r.email_address(), Some("ana@example.com"));
    }

    #[test]
    fn prefs_accept_camel_case_quiet_hours() {
        let prefs: NotifyPrefs = serde_json::from_value(serde_json::json!({
            "quietHours": { "start": "21:00", "end": "07:00" }
        }))
        .unwrap();
        let window = prefs.quiet_hours.unwrap();
        assert_eq!(window.start, "21:00");
        assert_eq!(window.end, "07:00");
    }

    #[test]
    fn channel_setting_is_none_without_entry() {
        let prefs = NotifyPrefs::default();
        assert_eq!(
            prefs.channel_setting(Category::AdminDigest, Channel::Email),
            None
        );
    }
}

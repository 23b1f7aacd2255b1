//! Integration settings for the external delivery channels.
//!
//! Read from the integration-settings store at delivery time and passed to
//! providers explicitly. The `is_configured` predicates are the only place
//! that decides whether a channel integration is usable.

use serde::{Deserialize, Serialize};

/// Placeholder printed instead of secrets in `Debug` output.
const REDACTED: &str = "[REDACTED]";

// ---------------------------------------------------------------------------
// SMTP
// ---------------------------------------------------------------------------

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    pub enabled: bool,
    pub host: String,
    pub port: Option<u16>,
    /// Implicit TLS (SMTPS) when `true`, STARTTLS otherwise.
    pub secure: bool,
    pub username: String,
    pub password: String,
    pub from_name: String,
    pub from_email: String,
}

impl SmtpSettings {
    /// Enabled and carrying host, port and credentials.
    pub fn is_configured(&self) -> bool {
        self.enabled
            && !self.host.trim().is_empty()
            && self.port.is_some()
            && !self.username.trim().is_empty()
            && !self.password.is_empty()
    }

    /// Sender address: `from_email`, or the SMTP username when unset.
    pub fn from_address(&self) -> &str {
        if self.from_email.trim().is_empty() {
            self.username.trim()
        } else {
            self.from_email.trim()
        }
    }
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("enabled", &self.enabled)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("username", &self.username)
            .field("password", &REDACTED)
            .field("from_name", &self.from_name)
            .field("from_email", &self.from_email)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// WhatsApp (Twilio)
// ---------------------------------------------------------------------------

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsAppSettings {
    pub enabled: bool,
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number in E.164, without the `whatsapp:` prefix.
    pub from_number: String,
}

impl WhatsAppSettings {
    pub fn is_configured(&self) -> bool {
        self.enabled
            && !self.account_sid.trim().is_empty()
            && !self.auth_token.is_empty()
            && !self.from_number.trim().is_empty()
    }
}

impl std::fmt::Debug for WhatsAppSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppSettings")
            .field("enabled", &self.enabled)
            .field("account_sid", &self.account_sid)
            .field("auth_token", &REDACTED)
            .field("from_number", &self.from_number)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// IntegrationSettings
// ---------------------------------------------------------------------------

/// All channel integrations. Defaults to everything disabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationSettings {
    pub smtp: SmtpSettings,
    pub whatsapp: WhatsAppSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp() -> SmtpSettings {
        SmtpSettings {
            enabled: true,
            host: "smtp.example.com".into(),
            port: Some(587),
            secure: false,
            username: "mailer@example.com".into(),
            password: "hunter2".into(),
            from_name: "Crewline".into(),
            from_email: String::new(),
        }
    }

    #[test]
    fn smtp_requires_enabled_host_port_and_credentials() {
        assert!(smtp().is_configured());
        assert!(!SmtpSettings { enabled: false, ..smtp() }.is_configured());
        assert!(!SmtpSettings { port: None, ..smtp() }.is_configured());
        assert!(!SmtpSettings { host: " ".into(), ..smtp() }.is_configured());
        assert!(!SmtpSettings { password: String::new(), ..smtp() }.is_configured());
    }

    #[test]
    fn from_address_falls_back_to_username() {
        assert_eq!(smtp().from_address(), "mailer@example.com");
        let with_from = SmtpSettings {
            from_email: "noreply@example.com".into(),
            ..smtp()
        };
        assert_eq!(with_from.from_address(), "noreply@example.com");
    }

    #[test]
    fn whatsapp_requires_all_credentials() {
        let wa = WhatsAppSettings {
            enabled: true,
            account_sid: "AC123".into(),
            auth_token: "secret".into(),
            from_number: "+15550001111".into(),
        };
        assert!(wa.is_configured());
        assert!(!WhatsAppSettings { from_number: String::new(), ..wa.clone() }.is_configured());
        assert!(!WhatsAppSettings::default().is_configured());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let settings = IntegrationSettings {
            smtp: smtp(),
            whatsapp: WhatsAppSettings {
                auth_token: "tok-abc".into(),
                ..Default::default()
            },
        };
        let printed = format!("{settings:?}");
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("tok-abc"));
        assert!(printed.contains(REDACTED));
    }

    #[test]
    fn missing_sections_deserialize_as_disabled() {
        let settings: IntegrationSettings = serde_json::from_str("{}").unwrap();
        assert!(!settings.smtp.enabled);
        assert!(!settings.whatsapp.enabled);
    }
}

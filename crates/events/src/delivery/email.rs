//! Email delivery via SMTP.
//!
//! [`SmtpEmailProvider`] builds a `lettre` async transport per call from the
//! [`SmtpSettings`] passed in, so settings changes take effect on the next
//! delivery without restarting anything.

use std::time::Duration;

use async_trait::async_trait;
use crewline_core::settings::SmtpSettings;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{ProviderReceipt, PROVIDER_SMTP};

/// Port used when the settings leave it unset (STARTTLS submission).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Per-connection SMTP timeout.
const SMTP_TIMEOUT: Duration = Duration::from_secs(15);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// Provider contract
// ---------------------------------------------------------------------------

/// A rendered email ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(
        &self,
        message: &EmailMessage,
        settings: &SmtpSettings,
    ) -> Result<ProviderReceipt, EmailError>;
}

// ---------------------------------------------------------------------------
// SmtpEmailProvider
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct SmtpEmailProvider;

impl SmtpEmailProvider {
    pub fn new() -> Self {
        Self
    }

    /// Assemble the MIME message. Returns it along with its `Message-ID`.
    fn build_message(
        message: &EmailMessage,
        settings: &SmtpSettings,
    ) -> Result<(Message, String), EmailError> {
        let from_address: Address = settings.from_address().parse()?;
        let from_name = settings.from_name.trim();
        let from = Mailbox::new(
            (!from_name.is_empty()).then(|| from_name.to_string()),
            from_address.clone(),
        );
        let to: Mailbox = message.to.trim().parse()?;
        let message_id = format!("<{}@{}>", uuid::Uuid::new_v4(), from_address.domain());

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.clone())
            .message_id(Some(message_id.clone()))
            .header(ContentType::TEXT_HTML)
            .body(message.html.clone())
            .map_err(|e| EmailError::Build(e.to_string()))?;
        Ok((email, message_id))
    }

    fn build_transport(
        settings: &SmtpSettings,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let host = settings.host.trim();
        let builder = if settings.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
        };
        Ok(builder
            .port(settings.port.unwrap_or(DEFAULT_SMTP_PORT))
            .credentials(Credentials::new(
                settings.username.trim().to_string(),
                settings.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build())
    }
}

#[async_trait]
impl EmailProvider for SmtpEmailProvider {
    async fn send(
        &self,
        message: &EmailMessage,
        settings: &SmtpSettings,
    ) -> Result<ProviderReceipt, EmailError> {
        let (email, message_id) = Self::build_message(message, settings)?;
        let mailer = Self::build_transport(settings)?;
        mailer.send(email).await?;

        tracing::info!(to = %message.to, message_id, "Notification email sent");
        Ok(ProviderReceipt::new(PROVIDER_SMTP, message_id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn settings() -> SmtpSettings {
        SmtpSettings {
            enabled: true,
            host: "smtp.example.com".into(),
            port: Some(587),
            secure: false,
            username: "mailer@example.com".into(),
            password: "secret".into(),
            from_name: "Crewline".into(),
            from_email: "noreply@example.com".into(),
        }
    }

    fn message(to: &str) -> EmailMessage {
        EmailMessage {
            to: to.into(),
            subject: "Timesheet due".into(),
            html: "<p>Please submit</p>".into(),
        }
    }

    #[test]
    fn message_id_uses_sender_domain() {
        let (_, id) = SmtpEmailProvider::build_message(&message("ana@example.com"), &settings())
            .unwrap();
        assert!(id.starts_with('<'));
        assert!(id.ends_with("@example.com>"));
    }

    #[test]
    fn message_is_html_with_display_name() {
        let (email, _) =
            SmtpEmailProvider::build_message(&message("ana@example.com"), &settings()).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(raw.contains("Content-Type: text/html"));
        assert!(raw.contains("Crewline <noreply@example.com>"));
    }

    #[tokio::test]
    async fn invalid_recipient_fails_before_connecting() {
        let err = SmtpEmailProvider::new()
            .send(&message("not-an-email"), &settings())
            .await
            .unwrap_err();
        assert_matches!(err, EmailError::Address(_));
    }

    #[test]
    fn sender_falls_back_to_username() {
        let mut s = settings();
        s.from_email.clear();
        let (email, _) =
            SmtpEmailProvider::build_message(&message("ana@example.com"), &s).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(raw.contains("mailer@example.com"));
    }
}

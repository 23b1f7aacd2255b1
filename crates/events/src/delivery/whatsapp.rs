//! WhatsApp delivery via the Twilio Messages API.
//!
//! [`TwilioWhatsAppProvider`] renders the template body with the request's
//! variables and posts it as a form to
//! `{base}/2010-04-01/Accounts/{sid}/Messages.json` with HTTP basic auth.
//! The `sid` in the response is returned as the provider message id and is
//! later used to correlate status callbacks.

use std::time::Duration;

use async_trait::async_trait;
use crewline_core::settings::WhatsAppSettings;
use crewline_core::template::render_str;
use crewline_core::types::{DbId, Payload};
use serde::Deserialize;

use super::{ProviderReceipt, PROVIDER_TWILIO};

/// Production Twilio API origin.
pub const TWILIO_API_BASE: &str = "https://api.twilio.com";

/// HTTP request timeout for a single send.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest error body kept in an error message.
const MAX_ERROR_BODY: usize = 300;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum WhatsAppError {
    /// The recipient number cannot be expressed in E.164.
    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Twilio answered with a non-2xx status.
    #[error("Twilio returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// A 2xx response without a message `sid`.
    #[error("Twilio response did not include a message sid")]
    MissingSid,
}

// ---------------------------------------------------------------------------
// Provider contract
// ---------------------------------------------------------------------------

/// A WhatsApp message before rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct WhatsAppMessage {
    /// Recipient phone number as stored; normalised by the provider.
    pub to_e164: String,
    pub template_body: String,
    pub variables: Payload,
    /// Notification this message belongs to.
    pub message_id: DbId,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WhatsAppProvider: Send + Sync {
    async fn send(
        &self,
        message: &WhatsAppMessage,
        settings: &WhatsAppSettings,
    ) -> Result<ProviderReceipt, WhatsAppError>;
}

/// Normalise a phone number to E.164 (`+` followed by 8 to 15 digits).
///
/// Separators (spaces, dashes, dots, parentheses) are dropped and a leading
/// `00` becomes `+`. Numbers without a country code are assumed to be North
/// American: ten digits gain `+1`, eleven digits starting with `1` gain `+`.
pub fn normalize_e164(phone: &str) -> Option<String> {
    let trimmed = phone.trim().trim_start_matches("whatsapp:");
    let has_plus = trimmed.starts_with('+');
    let mut digits = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' | '(' | ')' => {}
            '+' if digits.is_empty() => {}
            _ => return None,
        }
    }

    let digits = if has_plus {
        digits
    } else if let Some(rest) = digits.strip_prefix("00") {
        rest.to_string()
    } else if digits.len() == 10 {
        format!("1{digits}")
    } else if digits.len() == 11 && digits.starts_with('1') {
        digits
    } else {
        return None;
    };

    if (8..=15).contains(&digits.len()) && !digits.starts_with('0') {
        Some(format!("+{digits}"))
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// TwilioWhatsAppProvider
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TwilioMessageResponse {
    sid: Option<String>,
}

pub struct TwilioWhatsAppProvider {
    client: reqwest::Client,
    base_url: String,
}

impl TwilioWhatsAppProvider {
    pub fn new() -> Self {
        Self::with_base_url(TWILIO_API_BASE)
    }

    /// Point the provider at a different API origin (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn messages_url(&self, account_sid: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url,
            account_sid.trim()
        )
    }
}

impl Default for TwilioWhatsAppProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WhatsAppProvider for TwilioWhatsAppProvider {
    async fn send(
        &self,
        message: &WhatsAppMessage,
        settings: &WhatsAppSettings,
    ) -> Result<ProviderReceipt, WhatsAppError> {
        let to = normalize_e164(&message.to_e164)
            .ok_or_else(|| WhatsAppError::InvalidPhone(message.to_e164.clone()))?;
        let from = normalize_e164(&settings.from_number)
            .ok_or_else(|| WhatsAppError::InvalidPhone(settings.from_number.clone()))?;
        let body = render_str(&message.template_body, &message.variables);

        let form = [
            ("From", format!("whatsapp:{from}")),
            ("To", format!("whatsapp:{to}")),
            ("Body", body),
        ];
        let response = self
            .client
            .post(self.messages_url(&settings.account_sid))
            .basic_auth(settings.account_sid.trim(), Some(&settings.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(WhatsAppError::HttpStatus {
                status: status.as_u16(),
                body: truncate_chars(&text, MAX_ERROR_BODY),
            });
        }

        let parsed: TwilioMessageResponse = response.json().await?;
        let sid = parsed
            .sid
            .filter(|s| !s.is_empty())
            .ok_or(WhatsAppError::MissingSid)?;

        tracing::info!(
            notification_id = %message.message_id,
            sid = %sid,
            "WhatsApp message accepted"
        );
        Ok(ProviderReceipt::new(PROVIDER_TWILIO, sid))
    }
}

/// First `max` characters of `text`. Never splits a UTF-8 sequence.
fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SID: &str = "AC0123";

    fn settings() -> WhatsAppSettings {
        WhatsAppSettings {
            enabled: true,
            account_sid: SID.into(),
            auth_token: "token".into(),
            from_number: "+14155550100".into(),
        }
    }

    fn message(phone: &str) -> WhatsAppMessage {
        let variables = json!({ "name": "Ana" }).as_object().cloned().unwrap();
        WhatsAppMessage {
            to_e164: phone.into(),
            template_body: "Hi {{name}}, your timesheet is due".into(),
            variables,
            message_id: DbId::nil(),
        }
    }

    fn messages_path() -> String {
        format!("/2010-04-01/Accounts/{SID}/Messages.json")
    }

    // -----------------------------------------------------------------------
    // normalize_e164
    // -----------------------------------------------------------------------

    #[test]
    fn normalizes_common_formats() {
        assert_eq!(normalize_e164("+1 (212) 555-0100").as_deref(), Some("+12125550100"));
        assert_eq!(normalize_e164("212.555.0100").as_deref(), Some("+12125550100"));
        assert_eq!(normalize_e164("12125550100").as_deref(), Some("+12125550100"));
        assert_eq!(normalize_e164("0044 20 7946 0958").as_deref(), Some("+442079460958"));
        assert_eq!(normalize_e164("whatsapp:+5511987654321").as_deref(), Some("+5511987654321"));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(normalize_e164(""), None);
        assert_eq!(normalize_e164("call me"), None);
        assert_eq!(normalize_e164("12345"), None);
        assert_eq!(normalize_e164("+1234567890123456"), None);
    }

    // -----------------------------------------------------------------------
    // send
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn sends_rendered_body_and_returns_sid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(messages_path()))
            .and(header_exists("authorization"))
            .and(body_string_contains("To=whatsapp%3A%2B12125550100"))
            .and(body_string_contains("Hi+Ana"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sid": "SM42" })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = TwilioWhatsAppProvider::with_base_url(server.uri());
        let receipt = provider
            .send(&message("(212) 555-0100"), &settings())
            .await
            .unwrap();
        assert_eq!(receipt.provider, "twilio");
        assert_eq!(receipt.message_id.as_deref(), Some("SM42"));
    }

    #[tokio::test]
    async fn http_error_is_reported_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(messages_path()))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid To number"))
            .mount(&server)
            .await;

        let provider = TwilioWhatsAppProvider::with_base_url(server.uri());
        let err = provider
            .send(&message("+12125550100"), &settings())
            .await
            .unwrap_err();
        assert_matches!(err, WhatsAppError::HttpStatus { status: 400, ref body } if body.contains("invalid"));
    }

    #[tokio::test]
    async fn long_non_ascii_error_body_is_cut_on_a_char_boundary() {
        let server = MockServer::start().await;
        let body = format!("{}é trailing", "x".repeat(MAX_ERROR_BODY - 1));
        Mock::given(method("POST"))
            .and(path(messages_path()))
            .respond_with(ResponseTemplate::new(400).set_body_string(body))
            .mount(&server)
            .await;

        let provider = TwilioWhatsAppProvider::with_base_url(server.uri());
        let err = provider
            .send(&message("+12125550100"), &settings())
            .await
            .unwrap_err();
        assert_matches!(err, WhatsAppError::HttpStatus { status: 400, ref body } => {
            assert_eq!(body.chars().count(), MAX_ERROR_BODY);
            assert!(body.ends_with('é'));
        });
    }

    #[test]
    fn truncate_chars_keeps_short_text() {
        assert_eq!(truncate_chars("Müller", 300), "Müller");
        assert_eq!(truncate_chars("ééé", 2), "éé");
    }

    #[tokio::test]
    async fn missing_sid_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(messages_path()))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "status": "queued" })))
            .mount(&server)
            .await;

        let provider = TwilioWhatsAppProvider::with_base_url(server.uri());
        let err = provider
            .send(&message("+12125550100"), &settings())
            .await
            .unwrap_err();
        assert_matches!(err, WhatsAppError::MissingSid);
    }

    #[tokio::test]
    async fn invalid_phone_is_rejected_without_a_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let provider = TwilioWhatsAppProvider::with_base_url(server.uri());
        let err = provider.send(&message("n/a"), &settings()).await.unwrap_err();
        assert_matches!(err, WhatsAppError::InvalidPhone(_));
    }
}

//! Channel providers.
//!
//! Each provider takes a small owned input struct plus (for external
//! integrations) the settings read at delivery time, and returns a
//! [`ProviderReceipt`] or its own error type. Providers never decide whether
//! an integration is configured; the delivery worker filters channels before
//! dispatch.

use std::sync::Arc;

use serde::Serialize;

use crate::store::InboxStore;

pub mod email;
pub mod inapp;
pub mod whatsapp;

pub use email::{EmailError, EmailMessage, EmailProvider, SmtpEmailProvider};
pub use inapp::{InAppError, InAppMessage, InAppProvider, InboxInAppProvider};
pub use whatsapp::{TwilioWhatsAppProvider, WhatsAppError, WhatsAppMessage, WhatsAppProvider};

/// Provider name recorded on email results.
pub const PROVIDER_SMTP: &str = "smtp";

/// Provider name recorded on WhatsApp results.
pub const PROVIDER_TWILIO: &str = "twilio";

/// Provider name recorded on in-app results.
pub const PROVIDER_INAPP: &str = "inapp";

/// Successful dispatch through one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderReceipt {
    pub provider: String,
    pub message_id: Option<String>,
}

impl ProviderReceipt {
    pub fn new(provider: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            message_id: Some(message_id.into()),
        }
    }
}

/// One provider per channel.
#[derive(Clone)]
pub struct Providers {
    pub email: Arc<dyn EmailProvider>,
    pub whatsapp: Arc<dyn WhatsAppProvider>,
    pub in_app: Arc<dyn InAppProvider>,
}

impl Providers {
    /// Production providers: SMTP, Twilio, and the given inbox.
    pub fn live(inbox: Arc<dyn InboxStore>) -> Self {
        Self {
            email: Arc::new(SmtpEmailProvider::new()),
            whatsapp: Arc::new(TwilioWhatsAppProvider::new()),
            in_app: Arc::new(InboxInAppProvider::new(inbox)),
        }
    }
}

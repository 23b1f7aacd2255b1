//! Delivery channels, notification categories, and the default channel policy.
//!
//! Wire names here must match the values stored in `notifications.channels`
//! and in the per-user `notify_prefs.channels` preference map.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::recipient::Recipient;

/// Transactional email via SMTP.
pub const CHANNEL_EMAIL: &str = "email";

/// WhatsApp template message.
pub const CHANNEL_WHATSAPP: &str = "whatsapp";

/// In-app inbox entry.
pub const CHANNEL_IN_APP: &str = "inapp";

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// One delivery mechanism for a single notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "whatsapp")]
    WhatsApp,
    #[serde(rename = "inapp", alias = "inApp", alias = "in_app")]
    InApp,
}

impl Channel {
    /// Every channel, in dispatch order.
    pub const ALL: [Channel; 3] = [Channel::Email, Channel::WhatsApp, Channel::InApp];

    /// Canonical wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email => CHANNEL_EMAIL,
            Self::WhatsApp => CHANNEL_WHATSAPP,
            Self::InApp => CHANNEL_IN_APP,
        }
    }

    /// Parse a wire name. `inApp` and `in_app` are accepted for `inapp`
    /// because older preference documents used both spellings.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            CHANNEL_EMAIL => Ok(Self::Email),
            CHANNEL_WHATSAPP => Ok(Self::WhatsApp),
            CHANNEL_IN_APP | "inApp" | "in_app" => Ok(Self::InApp),
            other => Err(CoreError::Validation(format!(
                "Unknown channel '{other}'. Must be one of: email, whatsapp, inapp"
            ))),
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// De-duplicate a requested channel list, keeping first-seen order.
pub fn normalize_channels(channels: &[Channel]) -> Vec<Channel> {
    let mut out: Vec<Channel> = Vec::with_capacity(channels.len());
    for channel in channels {
        if !out.contains(channel) {
            out.push(*channel);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Notification category, the first key of a user's channel preference map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    TimesheetReminder,
    TimesheetDraftExpired,
    AdminDigest,
    CertificateExpiry,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TimesheetReminder => "timesheet_reminder",
            Self::TimesheetDraftExpired => "timesheet_draft_expired",
            Self::AdminDigest => "admin_digest",
            Self::CertificateExpiry => "certificate_expiry",
        }
    }
}

// ---------------------------------------------------------------------------
// Default policy
// ---------------------------------------------------------------------------

/// Default behaviour of one channel when a user has no explicit preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPolicy {
    pub channel: Channel,
    /// Included unless the user explicitly disables it.
    pub default_enabled: bool,
    /// Additionally requires the recipient's `whatsapp_opt_in` flag.
    pub requires_opt_in: bool,
}

/// Default-policy table consulted by [`pick_channels`].
pub const CHANNEL_POLICIES: [ChannelPolicy; 3] = [
    ChannelPolicy {
        channel: Channel::Email,
        default_enabled: true,
        requires_opt_in: false,
    },
    ChannelPolicy {
        channel: Channel::WhatsApp,
        default_enabled: true,
        requires_opt_in: true,
    },
    ChannelPolicy {
        channel: Channel::InApp,
        default_enabled: true,
        requires_opt_in: false,
    },
];

/// Choose the channels to request for `recipient` in `category`.
///
/// A channel is included iff the recipient's preference for
/// `(category, channel)` is not an explicit `false` (falling back to the
/// policy default), and, for opt-in channels, the recipient has opted in.
/// Contact details are not checked here; the delivery worker does that at
/// dispatch time.
pub fn pick_channels(recipient: &Recipient, category: Category) -> Vec<Channel> {
    CHANNEL_POLICIES
        .iter()
        .filter(|policy| {
            recipient
                .notify_prefs
                .channel_setting(category, policy.channel)
                .unwrap_or(policy.default_enabled)
        })
        .filter(|policy| !policy.requires_opt_in || recipient.whatsapp_opt_in)
        .map(|policy| policy.channel)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

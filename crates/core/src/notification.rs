//! Notification request model and delivery status state machine.
//!
//! A request is created in [`NotificationStatus::Scheduled`] and moves
//! exactly once to one of the terminal statuses. Terminal records are never
//! re-delivered.

use serde::{Deserialize, Serialize};

use crate::channels::{normalize_channels, Channel};
use crate::error::CoreError;
use crate::types::{DbId, Payload, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a notification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Scheduled,
    Sent,
    PartiallyFailed,
    Failed,
    SkippedQuietHours,
}

impl NotificationStatus {
    /// Stored name, matching the `notifications.status` check constraint.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Sent => "sent",
            Self::PartiallyFailed => "partially_failed",
            Self::Failed => "failed",
            Self::SkippedQuietHours => "skipped_quiet_hours",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "scheduled" => Ok(Self::Scheduled),
            "sent" => Ok(Self::Sent),
            "partially_failed" => Ok(Self::PartiallyFailed),
            "failed" => Ok(Self::Failed),
            "skipped_quiet_hours" => Ok(Self::SkippedQuietHours),
            other => Err(CoreError::Validation(format!(
                "Unknown notification status '{other}'"
            ))),
        }
    }

    /// Everything except `scheduled` is terminal.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Scheduled)
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a status change from `from` to `to` is allowed.
pub fn can_transition(from: NotificationStatus, to: NotificationStatus) -> bool {
    from == NotificationStatus::Scheduled && to.is_terminal()
}

// ---------------------------------------------------------------------------
// Channel results
// ---------------------------------------------------------------------------

/// Outcome of one channel dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    Ok,
    Error,
}

/// Per-channel outcome record, stored in `notifications.results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelResult {
    pub channel: Channel,
    pub status: ChannelStatus,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChannelResult {
    pub fn ok(channel: Channel, provider: impl Into<String>, message_id: Option<String>) -> Self {
        Self {
            channel,
            status: ChannelStatus::Ok,
            provider: provider.into(),
            message_id,
            error: None,
        }
    }

    pub fn error(channel: Channel, provider: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            channel,
            status: ChannelStatus::Error,
            provider: provider.into(),
            message_id: None,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == ChannelStatus::Error
    }
}

/// Final status for a set of dispatched channel results.
///
/// Zero attempted channels counts as a failure: nothing was delivered.
pub fn aggregate_status(results: &[ChannelResult]) -> NotificationStatus {
    let all_failed = results.iter().all(ChannelResult::is_error);
    let has_failures = results.iter().any(ChannelResult::is_error);
    if all_failed {
        NotificationStatus::Failed
    } else if has_failures {
        NotificationStatus::PartiallyFailed
    } else {
        NotificationStatus::Sent
    }
}

/// `"channel: error"` for every failed result, joined with `"; "`.
pub fn join_errors(results: &[ChannelResult]) -> Option<String> {
    let errors: Vec<String> = results
        .iter()
        .filter(|r| r.is_error())
        .map(|r| format!("{}: {}", r.channel, r.error.as_deref().unwrap_or("unknown error")))
        .collect();
    if errors.is_empty() {
        None
    } else {
        Some(errors.join("; "))
    }
}

/// Provider message id of a successful WhatsApp dispatch, kept on the
/// record for status-callback correlation.
pub fn provider_message_id(results: &[ChannelResult]) -> Option<String> {
    results
        .iter()
        .find(|r| r.channel == Channel::WhatsApp && !r.is_error())
        .and_then(|r| r.message_id.clone())
}

/// Everything the delivery worker writes in its terminal update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryOutcome {
    pub status: NotificationStatus,
    pub results: Vec<ChannelResult>,
    pub last_error: Option<String>,
    pub provider_message_id: Option<String>,
}

impl DeliveryOutcome {
    pub fn from_results(results: Vec<ChannelResult>) -> Self {
        Self {
            status: aggregate_status(&results),
            last_error: join_errors(&results),
            provider_message_id: provider_message_id(&results),
            results,
        }
    }
}

// ---------------------------------------------------------------------------
// Request records
// ---------------------------------------------------------------------------

/// A stored notification request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationRequest {
    pub id: DbId,
    pub user_id: DbId,
    pub template_key: String,
    pub channels: Vec<Channel>,
    pub payload: Payload,
    pub schedule_at: Option<Timestamp>,
    pub dedupe_key: Option<String>,
    pub priority_high: bool,
    pub status: NotificationStatus,
    pub attempts: i32,
    pub results: Vec<ChannelResult>,
    pub last_error: Option<String>,
    pub provider_message_id: Option<String>,
    pub sent_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl NotificationRequest {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// DTO for creating a notification request in `scheduled` status.
///
/// The id is generated up front (UUID v7) so callers can correlate a
/// request before it is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    pub id: DbId,
    pub user_id: DbId,
    pub template_key: String,
    pub channels: Vec<Channel>,
    pub payload: Payload,
    pub schedule_at: Option<Timestamp>,
    pub dedupe_key: Option<String>,
    pub priority_high: bool,
}

impl NewNotification {
    pub fn new(user_id: DbId, template_key: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::now_v7(),
            user_id,
            template_key: template_key.into(),
            channels: Vec::new(),
            payload: Payload::new(),
            schedule_at: None,
            dedupe_key: None,
            priority_high: false,
        }
    }

    /// Set the requested channels; duplicates are dropped.
    pub fn with_channels(mut self, channels: &[Channel]) -> Self {
        self.channels = normalize_channels(channels);
        self
    }

    /// Set the template payload. Non-object values are ignored.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        if let serde_json::Value::Object(map) = payload {
            self.payload = map;
        }
        self
    }

    pub fn with_schedule_at(mut self, at: Timestamp) -> Self {
        self.schedule_at = Some(at);
        self
    }

    pub fn with_dedupe_key(mut self, key: impl Into<String>) -> Self {
        self.dedupe_key = Some(key.into());
        self
    }

    pub fn with_priority_high(mut self, priority_high: bool) -> Self {
        self.priority_high = priority_high;
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(channel: Channel) -> ChannelResult {
        ChannelResult::ok(channel, "test", Some("m-1".into()))
    }

    fn err(channel: Channel, msg: &str) -> ChannelResult {
        ChannelResult::error(channel, "test", msg)
    }

    // -----------------------------------------------------------------------
    // State machine
    // -----------------------------------------------------------------------

    #[test]
    fn only_scheduled_is_non_terminal() {
        assert!(!NotificationStatus::Scheduled.is_terminal());
        assert!(NotificationStatus::Sent.is_terminal());
        assert!(NotificationStatus::PartiallyFailed.is_terminal());
        assert!(NotificationStatus::Failed.is_terminal());
        assert!(NotificationStatus::SkippedQuietHours.is_terminal());
    }

    #[test]
    fn terminal_states_have_no_transitions() {
        use NotificationStatus::*;
        for from in [Sent, PartiallyFailed, Failed, SkippedQuietHours] {
            for to in [Scheduled, Sent, PartiallyFailed, Failed, SkippedQuietHours] {
                assert!(!can_transition(from, to), "{from} -> {to}");
            }
        }
        assert!(can_transition(Scheduled, Sent));
        assert!(can_transition(Scheduled, SkippedQuietHours));
        assert!(!can_transition(Scheduled, Scheduled));
    }

    #[test]
    fn status_names_round_trip() {
        use NotificationStatus::*;
        for status in [Scheduled, Sent, PartiallyFailed, Failed, SkippedQuietHours] {
            assert_eq!(NotificationStatus::from_name(status.as_str()).unwrap(), status);
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.as_str());
        }
        assert!(NotificationStatus::from_name("queued").is_err());
    }

    // -----------------------------------------------------------------------
    // Aggregation
    // -----------------------------------------------------------------------

    #[test]
    fn all_ok_is_sent() {
        let results = [ok(Channel::Email), ok(Channel::InApp)];
        assert_eq!(aggregate_status(&results), NotificationStatus::Sent);
        assert_eq!(join_errors(&results), None);
    }

    #[test]
    fn mixed_is_partially_failed() {
        let results = [ok(Channel::Email), err(Channel::WhatsApp, "boom"), ok(Channel::InApp)];
        assert_eq!(aggregate_status(&results), NotificationStatus::PartiallyFailed);
        assert_eq!(join_errors(&results).as_deref(), Some("whatsapp: boom"));
    }

    #[test]
    fn all_errors_is_failed() {
        let results = [err(Channel::Email, "smtp down"), err(Channel::InApp, "db down")];
        assert_eq!(aggregate_status(&results), NotificationStatus::Failed);
        assert_eq!(
            join_errors(&results).as_deref(),
            Some("email: smtp down; inapp: db down")
        );
    }

    #[test]
    fn no_results_is_failed() {
        assert_eq!(aggregate_status(&[]), NotificationStatus::Failed);
    }

    #[test]
    fn provider_message_id_comes_from_successful_whatsapp() {
        let results = [
            ok(Channel::Email),
            ChannelResult::ok(Channel::WhatsApp, "twilio", Some("SM123".into())),
        ];
        assert_eq!(provider_message_id(&results).as_deref(), Some("SM123"));
        assert_eq!(provider_message_id(&[err(Channel::WhatsApp, "x")]), None);
    }

    #[test]
    fn outcome_collects_everything() {
        let outcome = DeliveryOutcome::from_results(vec![
            ok(Channel::InApp),
            err(Channel::Email, "refused"),
        ]);
        assert_eq!(outcome.status, NotificationStatus::PartiallyFailed);
        assert_eq!(outcome.last_error.as_deref(), Some("email: refused"));
        assert_eq!(outcome.results.len(), 2);
    }

    #[test]
    fn channel_result_serializes_without_empty_fields() {
        let json = serde_json::to_value(ChannelResult::ok(Channel::InApp, "inapp", None)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "channel": "inapp", "status": "ok", "provider": "inapp" })
        );
    }

    // -----------------------------------------------------------------------
    // NewNotification
    // -----------------------------------------------------------------------

    #[test]
    fn builder_normalizes_channels_and_ignores_non_object_payload() {
        let n = NewNotification::new(DbId::nil(), "timesheet_due")
            .with_channels(&[Channel::Email, Channel::Email, Channel::InApp])
            .with_payload(serde_json::json!(["not", "an", "object"]))
            .with_dedupe_key("k");
        assert_eq!(n.channels, vec![Channel::Email, Channel::InApp]);
        assert!(n.payload.is_empty());
        assert_eq!(n.dedupe_key.as_deref(), Some("k"));
        assert!(!n.priority_high);
    }
}

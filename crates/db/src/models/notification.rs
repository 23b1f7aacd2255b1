//! Notification request row model.

use crewline_core::notification::{NotificationRequest, NotificationStatus};
use crewline_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A raw row from the `notifications` table.
///
/// `channels`, `payload` and `results` are JSONB; conversion into
/// [`NotificationRequest`] validates them.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    pub id: DbId,
    pub user_id: DbId,
    pub template_key: String,
    pub channels: serde_json::Value,
    pub payload: serde_json::Value,
    pub schedule_at: Option<Timestamp>,
    pub dedupe_key: Option<String>,
    pub priority_high: bool,
    pub status: String,
    pub attempts: i32,
    pub results: serde_json::Value,
    pub last_error: Option<String>,
    pub provider_message_id: Option<String>,
    pub sent_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<NotificationRow> for NotificationRequest {
    type Error = sqlx::error::BoxDynError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let payload = match row.payload {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => serde_json::Map::new(),
            other => return Err(format!("payload must be a JSON object, got {other}").into()),
        };
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            template_key: row.template_key,
            channels: serde_json::from_value(row.channels)?,
            payload,
            schedule_at: row.schedule_at,
            dedupe_key: row.dedupe_key,
            priority_high: row.priority_high,
            status: NotificationStatus::from_name(&row.status)?,
            attempts: row.attempts,
            results: serde_json::from_value(row.results)?,
            last_error: row.last_error,
            provider_message_id: row.provider_message_id,
            sent_at: row.sent_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewline_core::channels::Channel;
    use serde_json::json;

    fn row() -> NotificationRow {
        NotificationRow {
            id: DbId::nil(),
            user_id: DbId::nil(),
            template_key: "timesheet_due".into(),
            channels: json!(["email", "inApp"]),
            payload: json!({ "week": "2026-10-12" }),
            schedule_at: None,
            dedupe_key: Some("ts:due:x:2026-10-12".into()),
            priority_high: false,
            status: "partially_failed".into(),
            attempts: 1,
            results: json!([
                { "channel": "email", "status": "error", "provider": "smtp", "error": "refused" },
                { "channel": "inapp", "status": "ok", "provider": "inbox", "message_id": "m-1" }
            ]),
            last_error: Some("email: refused".into()),
            provider_message_id: None,
            sent_at: Some(chrono::Utc::now()),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn converts_stored_row() {
        let req = NotificationRequest::try_from(row()).unwrap();
        assert_eq!(req.channels, vec![Channel::Email, Channel::InApp]);
        assert_eq!(req.status, NotificationStatus::PartiallyFailed);
        assert_eq!(req.results.len(), 2);
        assert!(req.results[0].is_error());
        assert_eq!(req.payload["week"], "2026-10-12");
    }

    #[test]
    fn rejects_unknown_status() {
        let mut r = row();
        r.status = "queued".into();
        assert!(NotificationRequest::try_from(r).is_err());
    }

    #[test]
    fn rejects_non_object_payload() {
        let mut r = row();
        r.payload = json!([1, 2]);
        assert!(NotificationRequest::try_from(r).is_err());
    }
}

//! Daily timesheet reminders and draft-expiry reminders for foremen.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use crewline_core::channels::Category;
use crewline_core::notification::NewNotification;
use crewline_core::quiet_hours::resolve_timezone;
use crewline_core::recipient::Recipient;
use crewline_core::roles::ROLE_FOREMAN;
use crewline_core::types::{DbId, Timestamp};
use crewline_db::models::timesheet::TimesheetSubmission;

use super::{
    request_for, NotificationScheduler, DRAFT_EXPIRY_AGE_HOURS, REMINDER_LOCAL_TIME,
    TEMPLATE_TIMESHEET_DRAFT_EXPIRED, TEMPLATE_TIMESHEET_DUE,
};
use crate::store::StoreResult;

pub fn due_dedupe_key(user_id: DbId, local_date: NaiveDate) -> String {
    format!("ts:due:{user_id}:{}", local_date.format("%Y-%m-%d"))
}

pub fn draft_expired_dedupe_key(submission_id: DbId) -> String {
    format!("ts:draft-expired:{submission_id}")
}

impl NotificationScheduler {
    pub(super) async fn daily_reminder_candidates(&self) -> StoreResult<Vec<NewNotification>> {
        let now = self.deps.clock.now();
        let foremen = self.deps.users.list_by_roles(&[ROLE_FOREMAN]).await?;

        let mut candidates: Vec<NewNotification> = foremen
            .iter()
            .filter_map(|foreman| due_reminder(foreman, now))
            .collect();

        let cutoff = now - Duration::hours(DRAFT_EXPIRY_AGE_HOURS);
        let drafts = self.deps.timesheets.list_drafts_created_before(cutoff).await?;
        let by_id: HashMap<DbId, &Recipient> = foremen.iter().map(|f| (f.id, f)).collect();
        for draft in &drafts {
            match by_id.get(&draft.foreman_id) {
                Some(foreman) => candidates.extend(draft_expired(foreman, draft)),
                None => tracing::debug!(
                    submission_id = %draft.id,
                    foreman_id = %draft.foreman_id,
                    "Draft owner is not an active foreman, skipping"
                ),
            }
        }

        Ok(candidates)
    }
}

/// Today's reminder for `foreman`, if they have a timezone and 18:30 local
/// time has not yet passed.
fn due_reminder(foreman: &Recipient, now: Timestamp) -> Option<NewNotification> {
    let timezone = foreman
        .timezone
        .as_deref()
        .map(str::trim)
        .filter(|tz| !tz.is_empty())?;
    let tz = resolve_timezone(Some(timezone));
    let local_date = now.with_timezone(&tz).date_naive();

    let (hour, minute) = REMINDER_LOCAL_TIME;
    let local_time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let reminder_at = tz
        .from_local_datetime(&local_date.and_time(local_time))
        .earliest()?
        .with_timezone(&Utc);
    if reminder_at <= now {
        return None;
    }

    let payload = serde_json::json!({
        "name": foreman.display_name,
        "date": local_date.format("%Y-%m-%d").to_string(),
        "due_time": local_time.format("%H:%M").to_string(),
    });
    request_for(foreman, Category::TimesheetReminder, TEMPLATE_TIMESHEET_DUE, payload).map(|req| {
        req.with_schedule_at(reminder_at)
            .with_dedupe_key(due_dedupe_key(foreman.id, local_date))
    })
}

fn draft_expired(foreman: &Recipient, draft: &TimesheetSubmission) -> Option<NewNotification> {
    let payload = serde_json::json!({
        "name": foreman.display_name,
        "submission_id": draft.id,
        "job_name": draft.job_name.as_deref().unwrap_or_default(),
        "week_start": draft.week_start.format("%Y-%m-%d").to_string(),
    });
    request_for(
        foreman,
        Category::TimesheetDraftExpired,
        TEMPLATE_TIMESHEET_DRAFT_EXPIRED,
        payload,
    )
    .map(|req| req.with_dedupe_key(draft_expired_dedupe_key(draft.id)))
}

//! In-memory implementation of every collaborator trait.
//!
//! Backs the test suites and local runs without a database. State lives in
//! one `Arc<RwLock<..>>`, so clones share it. Dedupe-key uniqueness is
//! enforced the same way as the partial unique index on
//! `notifications.dedupe_key`.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use crewline_core::notification::{
    can_transition, DeliveryOutcome, NewNotification, NotificationRequest, NotificationStatus,
};
use crewline_core::recipient::Recipient;
use crewline_core::settings::IntegrationSettings;
use crewline_core::template::TemplateContent;
use crewline_core::types::{DbId, Timestamp};
use crewline_db::models::certificate::ExpiringCertificate;
use crewline_db::models::inbox::InboxMessage;
use crewline_db::models::timesheet::{
    TimesheetSubmission, TIMESHEET_STATUS_DRAFT, TIMESHEET_STATUS_SUBMITTED,
};

use crate::audit::AuditEvent;
use crate::store::{
    AuditSink, CertificateSource, InboxStore, NotificationStore, SettingsStore, StoreError,
    StoreResult, TemplateStore, TimesheetSource, UserDirectory,
};

#[derive(Default)]
struct MemoryState {
    notifications: HashMap<DbId, NotificationRequest>,
    users: HashMap<DbId, Recipient>,
    inactive_users: HashSet<DbId>,
    templates: HashMap<String, TemplateContent>,
    settings: IntegrationSettings,
    submissions: Vec<TimesheetSubmission>,
    certificates: Vec<ExpiringCertificate>,
    inbox: Vec<InboxMessage>,
    audit: Vec<AuditEvent>,
}

impl MemoryState {
    /// Registered and not deactivated, like `users.is_active`.
    fn is_active_user(&self, id: DbId) -> bool {
        self.users.contains_key(&id) && !self.inactive_users.contains(&id)
    }

    /// Move a request to the terminal status `to` and apply `f`, only if the
    /// transition is allowed from its current status.
    fn finalize(
        &mut self,
        id: DbId,
        to: NotificationStatus,
        f: impl FnOnce(&mut NotificationRequest),
    ) -> bool {
        match self.notifications.get_mut(&id) {
            Some(req) if can_transition(req.status, to) => {
                req.status = to;
                f(req);
                req.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, MemoryState>> {
        self.state.read().map_err(|_| StoreError::LockPoisoned("read"))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state.write().map_err(|_| StoreError::LockPoisoned("write"))
    }

    // -----------------------------------------------------------------------
    // Seeding
    // -----------------------------------------------------------------------

    pub fn insert_user(&self, user: Recipient) -> StoreResult<()> {
        self.write()?.users.insert(user.id, user);
        Ok(())
    }

    /// Keep the user record but exclude it from role listings and
    /// certificate escalation.
    pub fn deactivate_user(&self, id: DbId) -> StoreResult<()> {
        self.write()?.inactive_users.insert(id);
        Ok(())
    }

    pub fn insert_template(&self, key: &str, template: TemplateContent) -> StoreResult<()> {
        self.write()?.templates.insert(key.to_string(), template);
        Ok(())
    }

    pub fn set_settings(&self, settings: IntegrationSettings) -> StoreResult<()> {
        self.write()?.settings = settings;
        Ok(())
    }

    pub fn insert_submission(&self, submission: TimesheetSubmission) -> StoreResult<()> {
        self.write()?.submissions.push(submission);
        Ok(())
    }

    pub fn insert_certificate(&self, certificate: ExpiringCertificate) -> StoreResult<()> {
        self.write()?.certificates.push(certificate);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// All stored requests, oldest first.
    pub fn notifications(&self) -> StoreResult<Vec<NotificationRequest>> {
        let mut all: Vec<_> = self.read()?.notifications.values().cloned().collect();
        all.sort_by_key(|n| (n.created_at, n.id));
        Ok(all)
    }

    pub fn inbox_for(&self, user_id: DbId) -> StoreResult<Vec<InboxMessage>> {
        Ok(self
            .read()?
            .inbox
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    pub fn audit_events(&self) -> StoreResult<Vec<AuditEvent>> {
        Ok(self.read()?.audit.clone())
    }
}

// ---------------------------------------------------------------------------
// NotificationStore
// ---------------------------------------------------------------------------

#[async_trait]
impl NotificationStore for MemoryBackend {
    async fn get(&self, id: DbId) -> StoreResult<Option<NotificationRequest>> {
        Ok(self.read()?.notifications.get(&id).cloned())
    }

    async fn dedupe_key_exists(&self, dedupe_key: &str) -> StoreResult<bool> {
        Ok(self
            .read()?
            .notifications
            .values()
            .any(|n| n.dedupe_key.as_deref() == Some(dedupe_key)))
    }

    async fn create_batch(&self, batch: &[NewNotification]) -> StoreResult<Vec<DbId>> {
        let mut state = self.write()?;
        let mut inserted = Vec::with_capacity(batch.len());
        for new in batch {
            let taken = new.dedupe_key.as_deref().is_some_and(|key| {
                state
                    .notifications
                    .values()
                    .any(|n| n.dedupe_key.as_deref() == Some(key))
            });
            if taken || state.notifications.contains_key(&new.id) {
                continue;
            }
            let now = Utc::now();
            state.notifications.insert(
                new.id,
                NotificationRequest {
                    id: new.id,
                    user_id: new.user_id,
                    template_key: new.template_key.clone(),
                    channels: new.channels.clone(),
                    payload: new.payload.clone(),
                    schedule_at: new.schedule_at,
                    dedupe_key: new.dedupe_key.clone(),
                    priority_high: new.priority_high,
                    status: NotificationStatus::Scheduled,
                    attempts: 0,
                    results: Vec::new(),
                    last_error: None,
                    provider_message_id: None,
                    sent_at: None,
                    created_at: now,
                    updated_at: now,
                },
            );
            inserted.push(new.id);
        }
        Ok(inserted)
    }

    async fn mark_skipped_quiet_hours(&self, id: DbId) -> StoreResult<bool> {
        Ok(self
            .write()?
            .finalize(id, NotificationStatus::SkippedQuietHours, |_| {}))
    }

    async fn mark_template_missing(&self, id: DbId, template_key: &str) -> StoreResult<bool> {
        Ok(self.write()?.finalize(id, NotificationStatus::Failed, |req| {
            req.last_error = Some(format!("Template {template_key} not found."));
        }))
    }

    async fn record_delivery(&self, id: DbId, outcome: &DeliveryOutcome) -> StoreResult<bool> {
        Ok(self.write()?.finalize(id, outcome.status, |req| {
            req.results = outcome.results.clone();
            req.last_error = outcome.last_error.clone();
            req.provider_message_id = outcome.provider_message_id.clone();
            req.attempts += 1;
            req.sent_at = Some(Utc::now());
        }))
    }

    async fn list_due(&self, now: Timestamp, limit: i64) -> StoreResult<Vec<DbId>> {
        let state = self.read()?;
        let mut due: Vec<&NotificationRequest> = state
            .notifications
            .values()
            .filter(|n| n.status == NotificationStatus::Scheduled)
            .filter(|n| n.schedule_at.map_or(true, |at| at <= now))
            .collect();
        due.sort_by_key(|n| (n.schedule_at.unwrap_or(n.created_at), n.id));
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(due.into_iter().take(limit).map(|n| n.id).collect())
    }
}

// ---------------------------------------------------------------------------
// Read-only collaborators
// ---------------------------------------------------------------------------

#[async_trait]
impl UserDirectory for MemoryBackend {
    async fn get_user(&self, id: DbId) -> StoreResult<Option<Recipient>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn list_by_roles(&self, roles: &[&str]) -> StoreResult<Vec<Recipient>> {
        let state = self.read()?;
        let mut users: Vec<Recipient> = state
            .users
            .values()
            .filter(|u| roles.contains(&u.role.as_str()))
            .filter(|u| !state.inactive_users.contains(&u.id))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.display_name.cmp(&b.display_name).then(a.id.cmp(&b.id)));
        Ok(users)
    }
}

#[async_trait]
impl TemplateStore for MemoryBackend {
    async fn get_template(&self, key: &str) -> StoreResult<Option<TemplateContent>> {
        Ok(self.read()?.templates.get(key).cloned())
    }
}

#[async_trait]
impl SettingsStore for MemoryBackend {
    async fn integration_settings(&self) -> StoreResult<IntegrationSettings> {
        Ok(self.read()?.settings.clone())
    }
}

#[async_trait]
impl TimesheetSource for MemoryBackend {
    async fn list_drafts_created_before(
        &self,
        cutoff: Timestamp,
    ) -> StoreResult<Vec<TimesheetSubmission>> {
        let mut drafts: Vec<TimesheetSubmission> = self
            .read()?
            .submissions
            .iter()
            .filter(|s| s.status == TIMESHEET_STATUS_DRAFT && s.created_at < cutoff)
            .cloned()
            .collect();
        drafts.sort_by_key(|s| s.created_at);
        Ok(drafts)
    }

    async fn count_submitted_before(&self, cutoff: Timestamp) -> StoreResult<i64> {
        let count = self
            .read()?
            .submissions
            .iter()
            .filter(|s| s.status == TIMESHEET_STATUS_SUBMITTED)
            .filter(|s| s.submitted_at.is_some_and(|at| at < cutoff))
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl CertificateSource for MemoryBackend {
    async fn list_expiring_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<ExpiringCertificate>> {
        let state = self.read()?;
        let mut certs: Vec<ExpiringCertificate> = state
            .certificates
            .iter()
            .filter(|c| c.expires_on >= from && c.expires_on <= to)
            .filter(|c| state.is_active_user(c.employee_id))
            .cloned()
            .collect();
        certs.sort_by_key(|c| (c.expires_on, c.id));
        Ok(certs)
    }
}

// ---------------------------------------------------------------------------
// Append-only sinks
// ---------------------------------------------------------------------------

#[async_trait]
impl AuditSink for MemoryBackend {
    async fn record(&self, event: AuditEvent) -> StoreResult<()> {
        self.write()?.audit.push(event);
        Ok(())
    }
}

#[async_trait]
impl InboxStore for MemoryBackend {
    async fn append(&self, user_id: DbId, notification_id: DbId, text: &str) -> StoreResult<DbId> {
        let id = uuid::Uuid::now_v7();
        self.write()?.inbox.push(InboxMessage {
            id,
            user_id,
            notification_id,
            text: text.to_string(),
            is_read: false,
            created_at: Utc::now(),
        });
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewline_core::channels::Channel;
    use crewline_core::notification::ChannelResult;

    fn keyed(key: &str) -> NewNotification {
        NewNotification::new(DbId::new_v4(), "timesheet_due")
            .with_channels(&[Channel::InApp])
            .with_dedupe_key(key)
    }

    #[tokio::test]
    async fn create_batch_enforces_dedupe_key_uniqueness() {
        let backend = MemoryBackend::new();
        let first = backend.create_batch(&[keyed("k1"), keyed("k2")]).await.unwrap();
        assert_eq!(first.len(), 2);

        let second = backend.create_batch(&[keyed("k1"), keyed("k3")]).await.unwrap();
        assert_eq!(second.len(), 1);
        assert!(backend.dedupe_key_exists("k3").await.unwrap());
        assert_eq!(backend.notifications().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn unkeyed_requests_are_never_deduplicated() {
        let backend = MemoryBackend::new();
        let user = DbId::new_v4();
        let batch = [
            NewNotification::new(user, "admin_digest"),
            NewNotification::new(user, "admin_digest"),
        ];
        assert_eq!(backend.create_batch(&batch).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn record_delivery_applies_once() {
        let backend = MemoryBackend::new();
        let ids = backend.create_batch(&[keyed("k")]).await.unwrap();
        let outcome =
            DeliveryOutcome::from_results(vec![ChannelResult::ok(Channel::InApp, "inapp", None)]);

        assert!(backend.record_delivery(ids[0], &outcome).await.unwrap());
        assert!(!backend.record_delivery(ids[0], &outcome).await.unwrap());

        let stored = backend.get(ids[0]).await.unwrap().unwrap();
        assert_eq!(stored.status, NotificationStatus::Sent);
        assert_eq!(stored.attempts, 1);
        assert!(stored.sent_at.is_some());
    }

    #[tokio::test]
    async fn list_due_skips_future_and_terminal_requests() {
        let backend = MemoryBackend::new();
        let now = Utc::now();
        let due = keyed("due").with_schedule_at(now - chrono::Duration::minutes(5));
        let later = keyed("later").with_schedule_at(now + chrono::Duration::hours(1));
        let unscheduled = keyed("asap");
        let done = keyed("done");
        let (due_id, asap_id, done_id) = (due.id, unscheduled.id, done.id);
        backend
            .create_batch(&[due, later, unscheduled, done])
            .await
            .unwrap();
        backend.mark_skipped_quiet_hours(done_id).await.unwrap();

        let ids = backend.list_due(now, 10).await.unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&due_id));
        assert!(ids.contains(&asap_id));
        assert_eq!(backend.list_due(now, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn terminal_status_is_never_overwritten() {
        let backend = MemoryBackend::new();
        let ids = backend.create_batch(&[keyed("quiet")]).await.unwrap();

        assert!(backend.mark_skipped_quiet_hours(ids[0]).await.unwrap());
        assert!(!backend.mark_template_missing(ids[0], "timesheet_due").await.unwrap());
        assert!(!backend.mark_skipped_quiet_hours(ids[0]).await.unwrap());

        let stored = backend.get(ids[0]).await.unwrap().unwrap();
        assert_eq!(stored.status, NotificationStatus::SkippedQuietHours);
        assert!(stored.last_error.is_none());
    }

    fn certificate(employee_id: DbId, expires_on: NaiveDate) -> ExpiringCertificate {
        ExpiringCertificate {
            id: DbId::new_v4(),
            name: "Forklift".into(),
            expires_on,
            employee_id,
            employee_name: "Eli".into(),
            supervisor_id: None,
        }
    }

    #[tokio::test]
    async fn inactive_or_unknown_users_are_excluded() {
        let backend = MemoryBackend::new();
        let mut active = Recipient::empty(DbId::new_v4());
        active.role = "Admin".into();
        let mut retired = Recipient::empty(DbId::new_v4());
        retired.role = "Admin".into();
        backend.insert_user(active.clone()).unwrap();
        backend.insert_user(retired.clone()).unwrap();
        backend.deactivate_user(retired.id).unwrap();

        let day = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();
        backend.insert_certificate(certificate(active.id, day)).unwrap();
        backend.insert_certificate(certificate(retired.id, day)).unwrap();
        backend.insert_certificate(certificate(DbId::new_v4(), day)).unwrap();

        let admins = backend.list_by_roles(&["Admin"]).await.unwrap();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].id, active.id);

        let certs = backend.list_expiring_between(day, day).await.unwrap();
        assert_eq!(certs.len(), 1);
        assert_eq!(certs[0].employee_id, active.id);

        // Deactivated users are still resolvable by id, like `UserRepo::find_by_id`.
        assert!(backend.get_user(retired.id).await.unwrap().is_some());
    }
}

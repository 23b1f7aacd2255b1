//! Periodic jobs that produce notification requests.
//!
//! Every job follows the same shape: scan business state, build candidate
//! requests, drop candidates whose dedupe key repeats within the batch or
//! already exists in storage, write the rest in one batch, and record an
//! audit event with the counts (also when nothing was created).

use std::collections::HashSet;
use std::sync::Arc;

use crewline_core::audit::action_types;
use crewline_core::channels::{pick_channels, Category};
use crewline_core::error::CoreError;
use crewline_core::notification::NewNotification;
use crewline_core::recipient::Recipient;
use serde::Serialize;

use crate::audit::{emit, AuditEvent};
use crate::clock::Clock;
use crate::store::{
    AuditSink, CertificateSource, NotificationStore, StoreResult, TimesheetSource, UserDirectory,
};

mod admin_digest;
mod certificate_expiry;
mod daily_reminder;

pub use certificate_expiry::certificate_dedupe_key;
pub use daily_reminder::{draft_expired_dedupe_key, due_dedupe_key};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const TEMPLATE_TIMESHEET_DUE: &str = "timesheet_due";
pub const TEMPLATE_TIMESHEET_DRAFT_EXPIRED: &str = "timesheet_draft_expired";
pub const TEMPLATE_ADMIN_DIGEST: &str = "admin_digest";
pub const TEMPLATE_CERTIFICATE_HOLDER: &str = "certificate_expiring_holder";
pub const TEMPLATE_CERTIFICATE_SUPERVISOR: &str = "certificate_expiring_supervisor";
pub const TEMPLATE_CERTIFICATE_ADMIN: &str = "certificate_expiring_admin";

/// Local wall-clock time (hour, minute) of the daily timesheet reminder.
pub const REMINDER_LOCAL_TIME: (u32, u32) = (18, 30);

/// Drafts older than this get an expiry reminder.
pub const DRAFT_EXPIRY_AGE_HOURS: i64 = 48;

/// Submissions waiting longer than this are counted in the admin digest.
pub const DIGEST_SUBMITTED_AGE_HOURS: i64 = 24;

/// Certificates expiring within this many days are escalated.
pub const CERTIFICATE_WINDOW_DAYS: i64 = 30;

// ---------------------------------------------------------------------------
// Job kinds and reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    DailyReminders,
    AdminDigest,
    CertificateExpiry,
}

impl JobKind {
    pub const ALL: [JobKind; 3] = [
        JobKind::DailyReminders,
        JobKind::AdminDigest,
        JobKind::CertificateExpiry,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DailyReminders => "daily-reminders",
            Self::AdminDigest => "admin-digest",
            Self::CertificateExpiry => "certificate-expiry",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "daily-reminders" => Ok(Self::DailyReminders),
            "admin-digest" => Ok(Self::AdminDigest),
            "certificate-expiry" => Ok(Self::CertificateExpiry),
            other => Err(CoreError::Validation(format!(
                "Unknown job '{other}'. Must be one of: daily-reminders, admin-digest, certificate-expiry"
            ))),
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one job run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobReport {
    pub job: JobKind,
    /// Candidates built before deduplication.
    pub candidates: usize,
    /// Requests actually written.
    pub created: usize,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct SchedulerDeps {
    pub notifications: Arc<dyn NotificationStore>,
    pub users: Arc<dyn UserDirectory>,
    pub timesheets: Arc<dyn TimesheetSource>,
    pub certificates: Arc<dyn CertificateSource>,
    pub audit: Arc<dyn AuditSink>,
    pub clock: Arc<dyn Clock>,
}

impl SchedulerDeps {
    pub fn from_backend<B>(backend: Arc<B>, clock: Arc<dyn Clock>) -> Self
    where
        B: NotificationStore
            + UserDirectory
            + TimesheetSource
            + CertificateSource
            + AuditSink
            + 'static,
    {
        Self {
            notifications: backend.clone(),
            users: backend.clone(),
            timesheets: backend.clone(),
            certificates: backend.clone(),
            audit: backend,
            clock,
        }
    }
}

pub struct NotificationScheduler {
    deps: SchedulerDeps,
}

impl NotificationScheduler {
    pub fn new(deps: SchedulerDeps) -> Self {
        Self { deps }
    }

    pub async fn run(&self, job: JobKind) -> StoreResult<JobReport> {
        match job {
            JobKind::DailyReminders => self.run_daily_reminders().await,
            JobKind::AdminDigest => self.run_admin_digest().await,
            JobKind::CertificateExpiry => self.run_certificate_expiry().await,
        }
    }

    pub async fn run_daily_reminders(&self) -> StoreResult<JobReport> {
        let candidates = self.daily_reminder_candidates().await?;
        self.persist(JobKind::DailyReminders, candidates).await
    }

    pub async fn run_admin_digest(&self) -> StoreResult<JobReport> {
        let candidates = self.admin_digest_candidates().await?;
        self.persist(JobKind::AdminDigest, candidates).await
    }

    pub async fn run_certificate_expiry(&self) -> StoreResult<JobReport> {
        let candidates = self.certificate_expiry_candidates().await?;
        self.persist(JobKind::CertificateExpiry, candidates).await
    }

    async fn persist(
        &self,
        job: JobKind,
        candidates: Vec<NewNotification>,
    ) -> StoreResult<JobReport> {
        let total = candidates.len();
        let mut seen: HashSet<String> = HashSet::new();
        let mut batch = Vec::with_capacity(total);
        for candidate in candidates {
            if let Some(key) = candidate.dedupe_key.as_deref() {
                if !seen.insert(key.to_string()) {
                    tracing::debug!(%job, dedupe_key = key, "Duplicate within batch, skipping");
                    continue;
                }
                if self.deps.notifications.dedupe_key_exists(key).await? {
                    tracing::debug!(%job, dedupe_key = key, "Already scheduled, skipping");
                    continue;
                }
            }
            batch.push(candidate);
        }

        let created = if batch.is_empty() {
            0
        } else {
            self.deps.notifications.create_batch(&batch).await?.len()
        };

        tracing::info!(%job, candidates = total, created, "Scheduler job finished");
        emit(
            self.deps.audit.as_ref(),
            AuditEvent::new(action_types::NOTIFICATION_SCHEDULER_RUN).with_details(
                serde_json::json!({
                    "job": job,
                    "candidates": total,
                    "created": created,
                }),
            ),
        )
        .await;

        Ok(JobReport {
            job,
            candidates: total,
            created,
        })
    }
}

/// A scheduled request for `user` on the channels their preferences allow,
/// or `None` if every channel is switched off.
fn request_for(
    user: &Recipient,
    category: Category,
    template_key: &str,
    payload: serde_json::Value,
) -> Option<NewNotification> {
    let channels = pick_channels(user, category);
    if channels.is_empty() {
        tracing::debug!(
            user_id = %user.id,
            category = category.as_str(),
            "All channels disabled by preference"
        );
        return None;
    }
    Some(
        NewNotification::new(user.id, template_key)
            .with_channels(&channels)
            .with_payload(payload),
    )
}

// ---------------------------------------------------------------------------
// Test fixtures
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::*;
    use crewline_core::channels::Channel;

    #[test]
    fn job_names_round_trip() {
        for job in JobKind::ALL {
            assert_eq!(JobKind::from_name(job.as_str()).unwrap(), job);
            assert_eq!(serde_json::to_value(job).unwrap(), job.as_str());
        }
        assert!(JobKind::from_name("weekly-report").is_err());
    }

    #[test]
    fn request_for_honours_preferences() {
        let mut user = fixtures::user("Ana", "Foreman", None);
        let req = request_for(&user, Category::AdminDigest, "k", serde_json::json!({})).unwrap();
        assert_eq!(req.channels, vec![Channel::Email, Channel::InApp]);

        user.notify_prefs = serde_json::from_value(serde_json::json!({
            "channels": { "admin_digest": { "email": false, "inapp": false } }
        }))
        .unwrap();
        assert!(request_for(&user, Category::AdminDigest, "k", serde_json::json!({})).is_none());
    }

    #[tokio::test]
    async fn run_dispatches_by_kind_and_audits_empty_runs() {
        let h = fixtures::harness();
        for job in JobKind::ALL {
            let report = h.scheduler.run(job).await.unwrap();
            assert_eq!(report.job, job);
            assert_eq!(report.created, 0);
        }
        let audit = h.backend.audit_events().unwrap();
        assert_eq!(audit.len(), 3);
        assert!(audit
            .iter()
            .all(|e| e.action_type == action_types::NOTIFICATION_SCHEDULER_RUN));
        assert_eq!(audit[1].details["job"], "admin-digest");
    }
}

//! Collaborator traits for the notification pipeline.
//!
//! The delivery worker and scheduler only ever talk to storage through these
//! traits. [`crate::PgBackend`] implements them over PostgreSQL and
//! [`crate::MemoryBackend`] over in-process maps.

use async_trait::async_trait;
use chrono::NaiveDate;
use crewline_core::notification::{DeliveryOutcome, NewNotification, NotificationRequest};
use crewline_core::recipient::Recipient;
use crewline_core::settings::IntegrationSettings;
use crewline_core::template::TemplateContent;
use crewline_core::types::{DbId, Timestamp};
use crewline_db::models::certificate::ExpiringCertificate;
use crewline_db::models::timesheet::TimesheetSubmission;

use crate::audit::AuditEvent;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Storage-layer failure. Never caught by the pipeline itself: it propagates
/// to whatever triggered the worker or scheduler.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Lock poisoned during {0}")]
    LockPoisoned(&'static str),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Notification requests
// ---------------------------------------------------------------------------

/// Durable store for notification requests.
///
/// Every `mark_*`/`record_*` method is a conditional update that only applies
/// while the request is still `scheduled`, and returns whether it applied.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn get(&self, id: DbId) -> StoreResult<Option<NotificationRequest>>;

    async fn dedupe_key_exists(&self, dedupe_key: &str) -> StoreResult<bool>;

    /// Insert all of `batch` atomically, skipping rows whose dedupe key is
    /// taken. Returns the inserted IDs.
    async fn create_batch(&self, batch: &[NewNotification]) -> StoreResult<Vec<DbId>>;

    async fn mark_skipped_quiet_hours(&self, id: DbId) -> StoreResult<bool>;

    async fn mark_template_missing(&self, id: DbId, template_key: &str) -> StoreResult<bool>;

    /// Write the terminal outcome, increment `attempts` and stamp `sent_at`.
    async fn record_delivery(&self, id: DbId, outcome: &DeliveryOutcome) -> StoreResult<bool>;

    /// IDs of scheduled requests that are due at `now`.
    async fn list_due(&self, now: Timestamp, limit: i64) -> StoreResult<Vec<DbId>>;
}

// ---------------------------------------------------------------------------
// Read-only collaborators
// ---------------------------------------------------------------------------

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, id: DbId) -> StoreResult<Option<Recipient>>;

    /// Active users holding any of `roles`.
    async fn list_by_roles(&self, roles: &[&str]) -> StoreResult<Vec<Recipient>>;
}

#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn get_template(&self, key: &str) -> StoreResult<Option<TemplateContent>>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn integration_settings(&self) -> StoreResult<IntegrationSettings>;
}

#[async_trait]
pub trait TimesheetSource: Send + Sync {
    async fn list_drafts_created_before(
        &self,
        cutoff: Timestamp,
    ) -> StoreResult<Vec<TimesheetSubmission>>;

    async fn count_submitted_before(&self, cutoff: Timestamp) -> StoreResult<i64>;
}

#[async_trait]
pub trait CertificateSource: Send + Sync {
    /// Certificates expiring within `[from, to]`, both inclusive.
    async fn list_expiring_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<ExpiringCertificate>>;
}

// ---------------------------------------------------------------------------
// Append-only sinks
// ---------------------------------------------------------------------------

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent) -> StoreResult<()>;
}

#[async_trait]
pub trait InboxStore: Send + Sync {
    /// Append an unread message for `user_id`, returning the entry id.
    async fn append(&self, user_id: DbId, notification_id: DbId, text: &str) -> StoreResult<DbId>;
}

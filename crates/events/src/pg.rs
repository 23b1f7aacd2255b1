//! PostgreSQL implementation of every collaborator trait, delegating to the
//! `crewline-db` repositories.

use async_trait::async_trait;
use chrono::NaiveDate;
use crewline_core::notification::{DeliveryOutcome, NewNotification, NotificationRequest};
use crewline_core::recipient::Recipient;
use crewline_core::settings::IntegrationSettings;
use crewline_core::template::TemplateContent;
use crewline_core::types::{DbId, Timestamp};
use crewline_db::models::certificate::ExpiringCertificate;
use crewline_db::models::timesheet::TimesheetSubmission;
use crewline_db::repositories::{
    AuditLogRepo, CertificateRepo, InboxRepo, IntegrationSettingsRepo, NotificationRepo,
    TemplateRepo, TimesheetRepo, UserRepo,
};
use crewline_db::DbPool;

use crate::audit::AuditEvent;
use crate::store::{
    AuditSink, CertificateSource, InboxStore, NotificationStore, SettingsStore, StoreResult,
    TemplateStore, TimesheetSource, UserDirectory,
};

#[derive(Clone)]
pub struct PgBackend {
    pool: DbPool,
}

impl PgBackend {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl NotificationStore for PgBackend {
    async fn get(&self, id: DbId) -> StoreResult<Option<NotificationRequest>> {
        Ok(NotificationRepo::find_by_id(&self.pool, id).await?)
    }

    async fn dedupe_key_exists(&self, dedupe_key: &str) -> StoreResult<bool> {
        Ok(NotificationRepo::dedupe_key_exists(&self.pool, dedupe_key).await?)
    }

    async fn create_batch(&self, batch: &[NewNotification]) -> StoreResult<Vec<DbId>> {
        Ok(NotificationRepo::create_batch(&self.pool, batch).await?)
    }

    async fn mark_skipped_quiet_hours(&self, id: DbId) -> StoreResult<bool> {
        Ok(NotificationRepo::mark_skipped_quiet_hours(&self.pool, id).await?)
    }

    async fn mark_template_missing(&self, id: DbId, template_key: &str) -> StoreResult<bool> {
        Ok(NotificationRepo::mark_template_missing(&self.pool, id, template_key).await?)
    }

    async fn record_delivery(&self, id: DbId, outcome: &DeliveryOutcome) -> StoreResult<bool> {
        Ok(NotificationRepo::record_delivery(&self.pool, id, outcome).await?)
    }

    async fn list_due(&self, now: Timestamp, limit: i64) -> StoreResult<Vec<DbId>> {
        Ok(NotificationRepo::list_due(&self.pool, now, limit).await?)
    }
}

#[async_trait]
impl UserDirectory for PgBackend {
    async fn get_user(&self, id: DbId) -> StoreResult<Option<Recipient>> {
        let user = UserRepo::find_by_id(&self.pool, id).await?;
        Ok(user.map(|u| u.into_recipient()))
    }

    async fn list_by_roles(&self, roles: &[&str]) -> StoreResult<Vec<Recipient>> {
        let users = UserRepo::list_active_by_roles(&self.pool, roles).await?;
        Ok(users.into_iter().map(|u| u.into_recipient()).collect())
    }
}

#[async_trait]
impl TemplateStore for PgBackend {
    async fn get_template(&self, key: &str) -> StoreResult<Option<TemplateContent>> {
        let row = TemplateRepo::find_by_key(&self.pool, key).await?;
        Ok(row.map(TemplateContent::from))
    }
}

#[async_trait]
impl SettingsStore for PgBackend {
    async fn integration_settings(&self) -> StoreResult<IntegrationSettings> {
        Ok(IntegrationSettingsRepo::get(&self.pool).await?)
    }
}

#[async_trait]
impl TimesheetSource for PgBackend {
    async fn list_drafts_created_before(
        &self,
        cutoff: Timestamp,
    ) -> StoreResult<Vec<TimesheetSubmission>> {
        Ok(TimesheetRepo::list_drafts_created_before(&self.pool, cutoff).await?)
    }

    async fn count_submitted_before(&self, cutoff: Timestamp) -> StoreResult<i64> {
        Ok(TimesheetRepo::count_submitted_before(&self.pool, cutoff).await?)
    }
}

#[async_trait]
impl CertificateSource for PgBackend {
    async fn list_expiring_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<ExpiringCertificate>> {
        Ok(CertificateRepo::list_expiring_between(&self.pool, from, to).await?)
    }
}

#[async_trait]
impl AuditSink for PgBackend {
    async fn record(&self, event: AuditEvent) -> StoreResult<()> {
        AuditLogRepo::insert(&self.pool, &event.into_create()).await?;
        Ok(())
    }
}

#[async_trait]
impl InboxStore for PgBackend {
    async fn append(&self, user_id: DbId, notification_id: DbId, text: &str) -> StoreResult<DbId> {
        Ok(InboxRepo::append(&self.pool, user_id, notification_id, text).await?)
    }
}

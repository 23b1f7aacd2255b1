//! Audit events emitted by the pipeline.
//!
//! Audit writes are fire-and-forget: [`emit`] logs a failed write and
//! returns, so a broken audit sink never fails a delivery or a job.

use crewline_core::audit::{redact_sensitive_fields, ENTITY_NOTIFICATION};
use crewline_core::types::DbId;
use crewline_db::models::audit::CreateAuditLog;
use serde::Serialize;

use crate::store::AuditSink;

/// One audit record, before persistence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    pub action_type: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
    pub details: serde_json::Value,
}

impl AuditEvent {
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            entity_type: None,
            entity_id: None,
            details: serde_json::Value::Null,
        }
    }

    /// Attach the notification this event is about.
    pub fn for_notification(mut self, id: DbId) -> Self {
        self.entity_type = Some(ENTITY_NOTIFICATION.to_string());
        self.entity_id = Some(id);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Convert into the insert DTO, masking sensitive detail fields.
    pub fn into_create(self) -> CreateAuditLog {
        let details_json = if self.details.is_null() {
            None
        } else {
            Some(redact_sensitive_fields(&self.details))
        };
        CreateAuditLog {
            action_type: self.action_type,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            details_json,
        }
    }
}

/// Write `event` to `sink`, logging instead of propagating failures.
pub async fn emit(sink: &dyn AuditSink, event: AuditEvent) {
    let action_type = event.action_type.clone();
    if let Err(e) = sink.record(event).await {
        tracing::warn!(action_type, error = %e, "Failed to write audit event");
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;

    use super::AuditEvent;
    use crate::store::{AuditSink, StoreError, StoreResult};

    /// Audit sink whose every write fails.
    pub struct FailingAuditSink;

    #[async_trait]
    impl AuditSink for FailingAuditSink {
        async fn record(&self, _event: AuditEvent) -> StoreResult<()> {
            Err(StoreError::LockPoisoned("write"))
        }
    }
}

//! Digest of submissions waiting on admin approval.

use chrono::Duration;
use crewline_core::channels::Category;
use crewline_core::notification::NewNotification;
use crewline_core::roles::ADMIN_ROLES;

use super::{request_for, NotificationScheduler, DIGEST_SUBMITTED_AGE_HOURS, TEMPLATE_ADMIN_DIGEST};
use crate::store::StoreResult;

/// Label describing the counted range, shown in the digest.
const RANGE_LABEL: &str = "submitted more than 24 hours ago";

impl NotificationScheduler {
    /// One digest per admin when any submission has waited too long.
    ///
    /// No dedupe key: the job's cadence bounds how often admins hear about it.
    pub(super) async fn admin_digest_candidates(&self) -> StoreResult<Vec<NewNotification>> {
        let cutoff = self.deps.clock.now() - Duration::hours(DIGEST_SUBMITTED_AGE_HOURS);
        let pending = self.deps.timesheets.count_submitted_before(cutoff).await?;
        if pending == 0 {
            return Ok(Vec::new());
        }

        let admins = self.deps.users.list_by_roles(ADMIN_ROLES).await?;
        Ok(admins
            .iter()
            .filter_map(|admin| {
                let payload = serde_json::json!({
                    "name": admin.display_name,
                    "count": pending,
                    "range_label": RANGE_LABEL,
                });
                request_for(admin, Category::AdminDigest, TEMPLATE_ADMIN_DIGEST, payload)
            })
            .collect())
    }
}

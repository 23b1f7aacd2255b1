//! Escalation of certificates nearing expiry.
//!
//! Each certificate expiring within the window notifies its holder, the
//! holder's supervisor and every admin. Dedupe keys are scoped to
//! (certificate, recipient), so daily runs reach each person once per
//! certificate.

use std::collections::HashMap;

use chrono::Duration;
use crewline_core::channels::Category;
use crewline_core::notification::NewNotification;
use crewline_core::quiet_hours::DEFAULT_TZ;
use crewline_core::recipient::Recipient;
use crewline_core::roles::ADMIN_ROLES;
use crewline_core::types::DbId;
use crewline_db::models::certificate::ExpiringCertificate;

use super::{
    request_for, NotificationScheduler, CERTIFICATE_WINDOW_DAYS, TEMPLATE_CERTIFICATE_ADMIN,
    TEMPLATE_CERTIFICATE_HOLDER, TEMPLATE_CERTIFICATE_SUPERVISOR,
};
use crate::store::StoreResult;

pub fn certificate_dedupe_key(certificate_id: DbId, recipient_id: DbId) -> String {
    format!("cert:expiring:{certificate_id}:{recipient_id}")
}

impl NotificationScheduler {
    pub(super) async fn certificate_expiry_candidates(&self) -> StoreResult<Vec<NewNotification>> {
        let today = self.deps.clock.now().with_timezone(&DEFAULT_TZ).date_naive();
        let until = today + Duration::days(CERTIFICATE_WINDOW_DAYS);
        let certificates = self
            .deps
            .certificates
            .list_expiring_between(today, until)
            .await?;
        if certificates.is_empty() {
            return Ok(Vec::new());
        }

        let admins = self.deps.users.list_by_roles(ADMIN_ROLES).await?;
        let mut users: HashMap<DbId, Option<Recipient>> = HashMap::new();
        let mut candidates = Vec::new();

        for cert in &certificates {
            let days_left = (cert.expires_on - today).num_days();
            let payload = serde_json::json!({
                "certificate_name": cert.name,
                "employee_name": cert.employee_name,
                "expires_on": cert.expires_on.format("%Y-%m-%d").to_string(),
                "days_left": days_left,
            });

            if let Some(holder) = self.cached_user(&mut users, cert.employee_id).await? {
                candidates.extend(notice(cert, &holder, TEMPLATE_CERTIFICATE_HOLDER, &payload));
            }
            if let Some(supervisor_id) = cert.supervisor_id {
                if let Some(supervisor) = self.cached_user(&mut users, supervisor_id).await? {
                    candidates.extend(notice(
                        cert,
                        &supervisor,
                        TEMPLATE_CERTIFICATE_SUPERVISOR,
                        &payload,
                    ));
                }
            }
            for admin in &admins {
                candidates.extend(notice(cert, admin, TEMPLATE_CERTIFICATE_ADMIN, &payload));
            }
        }

        Ok(candidates)
    }

    async fn cached_user(
        &self,
        cache: &mut HashMap<DbId, Option<Recipient>>,
        id: DbId,
    ) -> StoreResult<Option<Recipient>> {
        if let Some(user) = cache.get(&id) {
            return Ok(user.clone());
        }
        let user = self.deps.users.get_user(id).await?;
        cache.insert(id, user.clone());
        Ok(user)
    }
}

fn notice(
    cert: &ExpiringCertificate,
    recipient: &Recipient,
    template_key: &str,
    payload: &serde_json::Value,
) -> Option<NewNotification> {
    let mut payload = payload.clone();
    payload["name"] = serde_json::Value::String(recipient.display_name.clone());
    request_for(recipient, Category::CertificateExpiry, template_key, payload)
        .map(|req| req.with_dedupe_key(certificate_dedupe_key(cert.id, recipient.id)))
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{harness, user};
    use super::*;
    use chrono::NaiveDate;

    fn cert(employee: &Recipient, expires_on: NaiveDate) -> ExpiringCertificate {
        ExpiringCertificate {
            id: DbId::new_v4(),
            name: "Forklift".into(),
            expires_on,
            employee_id: employee.id,
            employee_name: employee.display_name.clone(),
            supervisor_id: employee.supervisor_id,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    #[tokio::test]
    async fn holder_supervisor_and_admins_are_notified_once() {
        let h = harness();
        let sup = user("Sue", "Foreman", None);
        let mut eli = user("Eli", "Employee", None);
        eli.supervisor_id = Some(sup.id);
        let ada = user("Ada", "Admin", None);
        let sam = user("Sam", "Super-Admin", None);
        for u in [&sup, &eli, &ada, &sam] {
            h.backend.insert_user(u.clone()).unwrap();
        }
        let expiring = cert(&eli, date(25));
        h.backend.insert_certificate(expiring.clone()).unwrap();

        let report = h.scheduler.run_certificate_expiry().await.unwrap();
        assert_eq!(report.created, 4);

        let stored = h.backend.notifications().unwrap();
        let template_for = |id: DbId| {
            stored
                .iter()
                .find(|n| n.user_id == id)
                .map(|n| n.template_key.clone())
                .unwrap()
        };
        assert_eq!(template_for(eli.id), TEMPLATE_CERTIFICATE_HOLDER);
        assert_eq!(template_for(sup.id), TEMPLATE_CERTIFICATE_SUPERVISOR);
        assert_eq!(template_for(ada.id), TEMPLATE_CERTIFICATE_ADMIN);
        assert!(stored.iter().all(|n| n.payload["days_left"] == 10));
        assert!(stored
            .iter()
            .any(|n| n.dedupe_key == Some(certificate_dedupe_key(expiring.id, eli.id))));

        let again = h.scheduler.run_certificate_expiry().await.unwrap();
        assert_eq!((again.candidates, again.created), (4, 0));
    }

    #[tokio::test]
    async fn window_excludes_expired_and_distant_certificates() {
        let h = harness();
        let eli = user("Eli", "Employee", None);
        h.backend.insert_user(eli.clone()).unwrap();
        h.backend.insert_certificate(cert(&eli, date(14))).unwrap();
        h.backend
            .insert_certificate(cert(&eli, NaiveDate::from_ymd_opt(2026, 2, 20).unwrap()))
            .unwrap();
        h.backend.insert_certificate(cert(&eli, date(15))).unwrap();

        let report = h.scheduler.run_certificate_expiry().await.unwrap();
        assert_eq!(report.created, 1);
        let stored = h.backend.notifications().unwrap();
        assert_eq!(stored[0].payload["days_left"], 0);
    }

    #[tokio::test]
    async fn supervisor_who_is_also_admin_is_notified_once() {
        let h = harness();
        let ada = user("Ada", "Admin", None);
        let mut eli = user("Eli", "Employee", None);
        eli.supervisor_id = Some(ada.id);
        h.backend.insert_user(ada.clone()).unwrap();
        h.backend.insert_user(eli.clone()).unwrap();
        h.backend.insert_certificate(cert(&eli, date(20))).unwrap();

        let report = h.scheduler.run_certificate_expiry().await.unwrap();
        assert_eq!((report.candidates, report.created), (3, 2));
        let to_ada: Vec<_> = h
            .backend
            .notifications()
            .unwrap()
            .into_iter()
            .filter(|n| n.user_id == ada.id)
            .collect();
        assert_eq!(to_ada.len(), 1);
        assert_eq!(to_ada[0].template_key, TEMPLATE_CERTIFICATE_SUPERVISOR);
    }
}

//! Employee certificate model.

use chrono::NaiveDate;
use crewline_core::types::DbId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A certificate joined with its holder, as returned by
/// `CertificateRepo::list_expiring_between`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ExpiringCertificate {
    pub id: DbId,
    pub name: String,
    pub expires_on: NaiveDate,
    pub employee_id: DbId,
    pub employee_name: String,
    /// The holder's assigned supervisor (`users.supervisor_id`).
    pub supervisor_id: Option<DbId>,
}

//! Timesheet submission model (read-only from the notification pipeline).

use chrono::NaiveDate;
use crewline_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Status of a timesheet still being edited by its foreman.
pub const TIMESHEET_STATUS_DRAFT: &str = "Draft";

/// Status of a timesheet awaiting admin approval.
pub const TIMESHEET_STATUS_SUBMITTED: &str = "Submitted";

/// A row from the `timesheet_submissions` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct TimesheetSubmission {
    pub id: DbId,
    pub foreman_id: DbId,
    pub job_name: Option<String>,
    pub week_start: NaiveDate,
    pub status: String,
    pub created_at: Timestamp,
    pub submitted_at: Option<Timestamp>,
}

//! Read queries over `timesheet_submissions` used by the scheduler.

use crewline_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::timesheet::{
    TimesheetSubmission, TIMESHEET_STATUS_DRAFT, TIMESHEET_STATUS_SUBMITTED,
};

const COLUMNS: &str = "id, foreman_id, job_name, week_start, status, created_at, submitted_at";

pub struct TimesheetRepo;

impl TimesheetRepo {
    /// Draft submissions created strictly before `cutoff`.
    pub async fn list_drafts_created_before(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<Vec<TimesheetSubmission>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM timesheet_submissions \
             WHERE status = $1 AND created_at < $2 \
             ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, TimesheetSubmission>(&query)
            .bind(TIMESHEET_STATUS_DRAFT)
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }

    /// Number of submissions still awaiting approval that were submitted
    /// strictly before `cutoff`.
    pub async fn count_submitted_before(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM timesheet_submissions \
             WHERE status = $1 AND submitted_at < $2",
        )
        .bind(TIMESHEET_STATUS_SUBMITTED)
        .bind(cutoff)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }
}

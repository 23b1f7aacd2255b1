use axum::routing::post;
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Scheduler job triggers.
///
/// ```text
/// POST /jobs/{job}    run_job (daily-reminders | admin-digest | certificate-expiry)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/jobs/{job}", post(jobs::run_job))
}

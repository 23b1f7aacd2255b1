//! Handler for on-demand scheduler runs.

use axum::extract::{Path, State};
use axum::Json;
use crewline_events::{JobKind, JobReport};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/jobs/{job}
pub async fn run_job(
    State(state): State<AppState>,
    Path(job): Path<String>,
) -> AppResult<Json<DataResponse<JobReport>>> {
    let job = JobKind::from_name(&job)?;
    tracing::info!(%job, "Scheduler job triggered over HTTP");
    let report = state.scheduler.run(job).await?;
    Ok(Json(DataResponse { data: report }))
}

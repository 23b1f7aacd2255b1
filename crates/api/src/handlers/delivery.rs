//! Handler for the delivery worker trigger.

use axum::extract::{Path, State};
use axum::Json;
use crewline_core::types::DbId;
use crewline_events::DeliveryReport;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/notifications/{id}/deliver
///
/// Runs the delivery worker for one request. Safe to call repeatedly: a
/// request that is already terminal is reported with
/// `already_terminal: true` and left untouched.
pub async fn deliver(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<DeliveryReport>>> {
    let id: DbId = id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid notification id '{id}'")))?;
    let report = state.worker.deliver(id).await?;
    Ok(Json(DataResponse { data: report }))
}

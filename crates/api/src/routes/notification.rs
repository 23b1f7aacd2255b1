use axum::routing::post;
use axum::Router;

use crate::handlers::delivery;
use crate::state::AppState;

/// Notification delivery trigger.
///
/// ```text
/// POST /notifications/{id}/deliver    deliver (idempotent)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/notifications/{id}/deliver", post(delivery::deliver))
}

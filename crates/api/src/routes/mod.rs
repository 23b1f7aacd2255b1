pub mod health;
pub mod jobs;
pub mod notification;

use axum::Router;

use crate::state::AppState;

/// All routes mounted under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(notification::router())
        .merge(jobs::router())
}

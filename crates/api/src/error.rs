use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use crewline_core::error::CoreError;
use crewline_events::{DeliveryError, StoreError};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds pipeline and HTTP-specific
/// variants. Implements [`IntoResponse`] to produce `{error, code}` JSON.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `crewline_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The notification's template does not exist; the request was failed.
    #[error("Template {0} not found.")]
    TemplateNotFound(String),

    /// A storage failure from the notification pipeline.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<DeliveryError> for AppError {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::NotFound(id) => AppError::Core(CoreError::NotFound {
                entity: "Notification",
                id,
            }),
            DeliveryError::TemplateNotFound { template_key, .. } => {
                AppError::TemplateNotFound(template_key)
            }
            DeliveryError::Store(e) => AppError::Store(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
            },
            AppError::TemplateNotFound(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "TEMPLATE_NOT_FOUND",
                self.to_string(),
            ),
            AppError::Store(err) => {
                tracing::error!(error = %err, "Store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use shared_types::ValidationErrors;
use ticket_engine::EngineError;

/// Everything a handler can fail with, mapped onto the HTTP contract.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Input violates a validation rule; reported with field-level details.
    #[error("{0}")]
    Validation(ValidationErrors),

    /// A lifecycle operation in a disallowed state.
    #[error("{0}")]
    Transition(EngineError),

    /// The requested resource does not exist yet.
    #[error("{0}")]
    NotFound(String),

    /// Anything unexpected; the core stays in its current state.
    #[error("{0}")]
    Internal(String),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<EngineError> for ApiError {
    fn from(error: EngineError) -> Self {
        Self::Transition(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => {
                warn!(count = errors.errors.len(), "Configuration validation failed");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "Configuration validation failed",
                        "details": errors.errors,
                    })),
                )
                    .into_response()
            }
            Self::Transition(engine_error) => {
                warn!(%engine_error, "Rejected lifecycle operation");
                (StatusCode::BAD_REQUEST, engine_error.to_string()).into_response()
            }
            Self::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            Self::Internal(message) => {
                error!(%message, "Unexpected gateway error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": message })),
                )
                    .into_response()
            }
        }
    }
}

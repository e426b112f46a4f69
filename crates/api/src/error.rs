use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::{StoreError, ZoneError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::warn!("Zone store unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service_unavailable",
                    msg.clone(),
                )
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ZoneError> for ApiError {
    fn from(err: ZoneError) -> Self {
        match err {
            ZoneError::Validation(msg) => ApiError::Validation(msg),
            ZoneError::NotFound(id) => ApiError::NotFound(format!("Zone {} not found", id)),
            ZoneError::Storage(StoreError::Unavailable(msg)) => ApiError::ServiceUnavailable(msg),
            ZoneError::Storage(err @ StoreError::Corrupt { .. }) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::import::ImportError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

fn import_status(err: &ImportError) -> StatusCode {
    match err {
        ImportError::InvalidFileType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ImportError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        ImportError::EmptyContent => StatusCode::UNPROCESSABLE_ENTITY,
        ImportError::ExtractionFailed(_) => StatusCode::BAD_GATEWAY,
        ImportError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ImportError::Busy(_) | ImportError::InvalidTransition { .. } | ImportError::Cancelled => {
            StatusCode::CONFLICT
        }
        ImportError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, retryable) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), false),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                false,
            ),
            AppError::Import(e) => {
                match e {
                    ImportError::Internal(detail) => {
                        tracing::error!("Import internal error: {detail}")
                    }
                    ImportError::InvalidFileType { file_name } => {
                        tracing::debug!("Rejected upload '{file_name}'")
                    }
                    _ => {}
                }
                (import_status(e), e.code(), e.to_string(), e.retryable())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    true,
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "retryable": retryable
            }
        }));

        (status, body).into_response()
    }
}

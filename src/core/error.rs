use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::constants::NO_FILE_UPLOADED_MESSAGE;
use crate::shared::types::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("No file uploaded")]
    NoFileUploaded,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Storage write failed: {0}")]
    StorageWrite(String),

    #[error("Storage visibility change failed: {0}")]
    StorageVisibility(String),

    #[error("Storage call timed out: {0}")]
    StorageTimeout(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            // Plain text, not the JSON envelope
            AppError::NoFileUploaded => {
                return (
                    StatusCode::BAD_REQUEST,
                    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                    NO_FILE_UPLOADED_MESSAGE,
                )
                    .into_response();
            }
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::PayloadTooLarge(ref msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            AppError::StorageWrite(ref msg) => {
                tracing::error!("Storage write error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to store the uploaded file".to_string(),
                )
            }
            AppError::StorageVisibility(ref msg) => {
                tracing::error!("Storage visibility error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to make the uploaded file public".to_string(),
                )
            }
            AppError::StorageTimeout(ref msg) => {
                tracing::error!("Storage timeout: {}", msg);
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "Storage service did not respond in time".to_string(),
                )
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ApiResponse::<()>::error(Some(message), None));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::modules::datastore::StorageError;
use crate::shared::types::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::Storage(ref e) => storage_error_parts(e),
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Validation(ref msg) => (
                StatusCode::BAD_REQUEST,
                msg.clone(),
                Some(vec![msg.clone()]),
            ),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Auth(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::Unauthorized(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::Forbidden(ref msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, msg.clone(), None),
        };

        let body = Json(ApiResponse::<()>::error(Some(message), errors));

        (status, body).into_response()
    }
}

/// Connectivity and configuration failures are user-facing; local I/O faults are not.
fn storage_error_parts(e: &StorageError) -> (StatusCode, String, Option<Vec<String>>) {
    match e {
        StorageError::NotConnected => (StatusCode::BAD_REQUEST, e.to_string(), None),
        StorageError::InvalidConfig(msg) => (
            StatusCode::BAD_REQUEST,
            e.to_string(),
            Some(vec![msg.clone()]),
        ),
        StorageError::Remote(_) | StorageError::Migration(_) => {
            tracing::error!("Remote store error: {:?}", e);
            (StatusCode::BAD_GATEWAY, e.to_string(), None)
        }
        StorageError::Io(_) | StorageError::Serialization(_) => {
            tracing::error!("Local storage error: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Storage error occurred".to_string(),
                None,
            )
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

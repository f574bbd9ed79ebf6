//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::response::{ApiResponse, FieldError};

/// Convenience alias for handler return types.
pub type ApiResult<T> = Result<T, ApiError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                Some(errors),
            ),
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m, None),
            ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m, None),
            ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m, None),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, m, None),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m, None),
            ApiError::Internal(detail) => {
                // The cause stays server-side; the client sees only a generic message.
                tracing::error!(error = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };
        let body = Json(ApiResponse::failure(&message, errors));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ApiError::NotFound("row not found".into()),
            _ => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<fleet_core::auth::AuthError> for ApiError {
    fn from(e: fleet_core::auth::AuthError) -> Self {
        match e {
            fleet_core::auth::AuthError::CredentialError => {
                ApiError::Unauthorized("Invalid credentials".into())
            }
            fleet_core::auth::AuthError::TokenError(msg) => ApiError::Unauthorized(msg),
            fleet_core::auth::AuthError::ValidationError(msg) => ApiError::BadRequest(msg),
            fleet_core::auth::AuthError::DbError(e) => ApiError::from(e),
            fleet_core::auth::AuthError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

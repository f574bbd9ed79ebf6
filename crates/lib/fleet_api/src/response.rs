//! Standard API response envelope.
//!
//! Every endpoint, success or failure, answers with
//! `{ success, message?, data?, errors? }`.

use serde::Serialize;

/// Response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

/// Field-level validation error.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response with payload.
    pub fn success(data: T, message: &str) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            data: Some(data),
            errors: None,
        }
    }
}

impl ApiResponse<()> {
    /// Successful response with a message and no payload.
    pub fn message_only(message: &str) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            data: None,
            errors: None,
        }
    }

    /// Failure envelope, optionally with field-level errors.
    pub fn failure(message: &str, errors: Option<Vec<FieldError>>) -> Self {
        Self {
            success: false,
            message: Some(message.to_string()),
            data: None,
            errors,
        }
    }
}

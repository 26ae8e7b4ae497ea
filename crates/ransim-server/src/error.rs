//! API error types with HTTP status code mapping.
//!
//! [`ApiError`] is the unified error type for all endpoints. It implements
//! `axum::response::IntoResponse` and renders
//! `{"success": false, "error": {code, message, details}}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use ransim_compute::ComputeError;
use ransim_core::CoreError;
use ransim_storage::StorageError;

/// Structured error detail in API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "BAD_REQUEST").
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// One rejected request field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Entity not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A single field was rejected by the topology (400).
    #[error("invalid {field}: {message}")]
    InvalidField { field: String, message: String },

    /// Request payload failed numeric validation (422).
    #[error("validation failed")]
    ValidationFailed(Vec<FieldError>),

    /// The simulation cannot compute in its current state (412).
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// Internal server error (500).
    #[error("internal error: {0}")]
    InternalError(String),

    /// Resource conflict (409).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::InvalidField { .. } => StatusCode::BAD_REQUEST,
            ApiError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    fn detail(&self) -> ApiErrorDetail {
        let (code, message, details) = match self {
            ApiError::NotFound(msg) => ("NOT_FOUND", msg.clone(), None),
            ApiError::BadRequest(msg) => ("BAD_REQUEST", msg.clone(), None),
            ApiError::InvalidField { field, message } => (
                "BAD_REQUEST",
                format!("invalid {}: {}", field, message),
                Some(serde_json::json!({ "field": field })),
            ),
            ApiError::ValidationFailed(errors) => (
                "VALIDATION_FAILED",
                format!("{} validation error(s)", errors.len()),
                serde_json::to_value(errors).ok(),
            ),
            ApiError::PreconditionFailed(msg) => ("PRECONDITION_FAILED", msg.clone(), None),
            ApiError::InternalError(msg) => ("INTERNAL_ERROR", msg.clone(), None),
            ApiError::Conflict(msg) => ("CONFLICT", msg.clone(), None),
        };
        ApiErrorDetail {
            code: code.to_string(),
            message,
            details,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "success": false,
            "error": self.detail(),
        });
        (self.status(), axum::Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match &err {
            CoreError::SiteNotFound { .. }
            | CoreError::SiteIndexOutOfRange { .. }
            | CoreError::CellNotFound { .. }
            | CoreError::CellIndexOutOfRange { .. } => ApiError::NotFound(err.to_string()),
            _ => match err.field() {
                Some(field) => ApiError::InvalidField {
                    field: field.to_string(),
                    message: err.to_string(),
                },
                None => ApiError::BadRequest(err.to_string()),
            },
        }
    }
}

impl From<ComputeError> for ApiError {
    fn from(err: ComputeError) -> Self {
        if err.is_precondition() {
            return ApiError::PreconditionFailed(err.to_string());
        }
        match err {
            ComputeError::UnsupportedPattern { .. } => ApiError::BadRequest(err.to_string()),
            _ => ApiError::InternalError(err.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::RunNotFound(_) => ApiError::NotFound(err.to_string()),
            _ => ApiError::InternalError(err.to_string()),
        }
    }
}

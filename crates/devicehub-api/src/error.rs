//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps [`RegistryError`] outcomes to HTTP status codes and returns JSON
//! error bodies with a machine-readable code and a human-readable
//! message. Internal failure detail is never exposed to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use devicehub_core::RegistryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses use this format for consistency across the API
/// surface.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "CONFLICT").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Requested device does not exist (404).
    #[error("{0}")]
    NotFound(String),

    /// A required field was blank or otherwise invalid (422). Carries
    /// the offending field when attributable, surfaced in `details`.
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<&'static str>,
    },

    /// Request body could not be parsed (422). Normalized with
    /// `Validation`: the client sent syntactically valid HTTP but
    /// semantically invalid content.
    #[error("{0}")]
    BadRequest(String),

    /// The mutation conflicts with the device's lifecycle state (409).
    /// Carries the specific rule reason, surfaced verbatim.
    #[error("{0}")]
    Conflict(String),

    /// Internal failure (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Validation failure, optionally attributed to a single field.
    pub fn validation(message: impl Into<String>, field: Option<&'static str>) -> Self {
        Self::Validation {
            message: message.into(),
            field,
        }
    }

    /// HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::UNPROCESSABLE_ENTITY, "BAD_REQUEST"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Structured client-facing detail, when the error carries any.
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation {
                field: Some(field), ..
            } => Some(serde_json::json!({ "field": field })),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        // Log server-side errors for operator visibility; business
        // outcomes are logged where they occur.
        if let Self::Internal(_) = &self {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Map registry outcomes onto the HTTP error taxonomy.
impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match &err {
            RegistryError::NotFound(_) => Self::NotFound(err.to_string()),
            RegistryError::Rule(_) => Self::Conflict(err.to_string()),
            RegistryError::Validation(v) => Self::validation(err.to_string(), Some(v.field())),
            RegistryError::Storage(_) => Self::Internal(err.to_string()),
        }
    }
}

//! # Request Validation
//!
//! The [`Validate`] trait for request DTOs plus helpers to extract JSON
//! bodies with uniform error mapping: deserialization failures become
//! [`AppError::BadRequest`], rule failures [`AppError::Validation`].

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Business-rule validation for request DTOs, beyond what serde checks.
pub trait Validate {
    /// Returns a caller-facing validation error on failure.
    fn validate(&self) -> Result<(), AppError>;
}

/// Extract a JSON body, mapping rejections to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and run its [`Validate`] rules.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate()?;
    Ok(value)
}

//! Request body shape checks
//!
//! Bodies are deserialized strictly (unknown fields rejected by the request
//! types) and then checked by their [`Validate`] impl. Failures render as
//! `422 validation_error` naming the field; the offending value is never
//! echoed back or logged.
//!
//! # Usage
//!
//! ```ignore
//! use gatekeeper::validation::{validate_length, Validate, ValidatedJson};
//!
//! impl Validate for SignInRequest {
//!     fn validate(&self) -> Result<(), ValidationError> {
//!         validate_length(&self.username, 1, 64, "username")
//!     }
//! }
//!
//! async fn sign_in(ValidatedJson(body): ValidatedJson<SignInRequest>) { /* ... */ }
//! ```

use std::fmt;

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// A field that failed its shape check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn for_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err.to_string())
    }
}

/// Trait for types that can check their own shape
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Reject empty or whitespace-only values
pub fn validate_required(value: &str, field: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::for_field(field, "Field is required"));
    }
    Ok(())
}

/// Validate string length bounds, counted in characters (inclusive)
pub fn validate_length(
    value: &str,
    min: usize,
    max: usize,
    field: &str,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min {
        return Err(ValidationError::for_field(
            field,
            format!("Must be at least {} characters", min),
        ));
    }
    if len > max {
        return Err(ValidationError::for_field(
            field,
            format!("Must be at most {} characters", max),
        ));
    }
    Ok(())
}

/// JSON extractor that runs [`Validate`] after deserializing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            tracing::debug!(error = %e, "JSON parsing failed");
            AppError::bad_request("Failed to parse JSON body").with_details(e.body_text())
        })?;

        if let Err(error) = value.validate() {
            tracing::debug!(field = %error.field, "Request validation failed");
            return Err(error.into());
        }

        Ok(ValidatedJson(value))
    }
}

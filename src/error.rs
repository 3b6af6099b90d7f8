//! Error taxonomy and HTTP error responses
//!
//! Two layers:
//! - [`AuthError`] is what the identity core returns. It keeps internal
//!   distinctions (bad signature vs. expired token) for diagnostics.
//! - [`AppError`] is what the transport layer renders. Token problems of
//!   every flavor collapse into a single `401 unauthorized` so callers
//!   cannot probe why a token was refused.
//!
//! # Usage
//!
//! ```ignore
//! use gatekeeper::error::{AppError, AuthError};
//!
//! async fn handler() -> Result<Json<Identity>, AppError> {
//!     let identity = service.get_me(&caller_id)?; // AuthError -> AppError
//!     Ok(Json(identity))
//! }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;
use thiserror::Error;

use crate::config::Environment;

// ============================================================================
// Core Errors
// ============================================================================

/// Failures of the identity core (store, validator, session issuer, gate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No record for the given id or username
    #[error("User not found")]
    NotFound,

    /// Credential mismatch or missing credentials
    #[error("Invalid username or password")]
    Unauthorized,

    /// Token is malformed or its signature does not verify
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token verified but its expiry has passed
    #[error("Token expired")]
    Expired,

    /// Username already belongs to another record
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unexpected failure (hashing, token encoding)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub(crate) fn invalid_token(detail: impl Into<String>) -> Self {
        Self::InvalidToken(detail.into())
    }

    pub(crate) fn internal(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }
}

/// Result type alias for core operations
pub type AuthResult<T> = std::result::Result<T, AuthError>;

// ============================================================================
// Error Configuration
// ============================================================================

/// Controls how much detail reaches the client.
#[derive(Debug, Clone)]
pub struct ErrorConfig {
    /// Whether to expose internal details in responses
    /// Should be `false` in production
    pub expose_details: bool,

    /// Message shown for internal errors
    pub internal_error_message: String,
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl ErrorConfig {
    /// Production configuration (secure defaults)
    pub fn production() -> Self {
        Self {
            expose_details: false,
            internal_error_message: "An internal error occurred".to_string(),
        }
    }

    /// Development configuration (detailed errors)
    pub fn development() -> Self {
        Self {
            expose_details: true,
            internal_error_message: "Internal server error".to_string(),
        }
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Development | Environment::Test => Self::development(),
            Environment::Production | Environment::Staging => Self::production(),
        }
    }
}

// Set once at startup
static ERROR_CONFIG: std::sync::OnceLock<ErrorConfig> = std::sync::OnceLock::new();

/// Initialize error handling configuration
///
/// Later calls are ignored.
pub fn init(config: ErrorConfig) {
    let _ = ERROR_CONFIG.set(config);
}

/// Get the current error configuration
pub fn config() -> &'static ErrorConfig {
    ERROR_CONFIG.get_or_init(ErrorConfig::default)
}

// ============================================================================
// HTTP Errors
// ============================================================================

/// Error rendered by the transport layer.
#[derive(Debug)]
pub struct AppError {
    /// Error kind determines HTTP status and handling
    pub kind: ErrorKind,
    /// User-facing message (safe to expose)
    pub message: String,
    /// Internal details (logged, exposed only in development)
    pub details: Option<String>,
}

/// Error categories with their HTTP status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad request (400)
    BadRequest,
    /// Unauthorized (401)
    Unauthorized,
    /// Not found (404)
    NotFound,
    /// Conflict (409)
    Conflict,
    /// Unprocessable entity (422)
    Validation,
    /// Internal server error (500)
    Internal,
}

impl ErrorKind {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether details can be safely exposed for this error kind
    pub fn expose_details(&self) -> bool {
        matches!(
            self,
            Self::BadRequest | Self::Validation | Self::NotFound | Self::Conflict
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest => write!(f, "bad_request"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Validation => write!(f, "validation_error"),
            Self::Internal => write!(f, "internal_error"),
        }
    }
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Add internal details (logged, never shown for auth failures)
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    fn log(&self) {
        let details = self.details.as_deref().unwrap_or("none");

        match self.kind {
            ErrorKind::Internal => {
                tracing::error!(
                    error_kind = %self.kind,
                    message = %self.message,
                    details = %details,
                    "Internal error"
                );
            }
            ErrorKind::Unauthorized => {
                tracing::warn!(
                    error_kind = %self.kind,
                    details = %details,
                    "Auth error"
                );
            }
            _ => {
                tracing::debug!(
                    error_kind = %self.kind,
                    message = %self.message,
                    "Client error"
                );
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for AppError {}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotFound => AppError::not_found("User not found"),
            AuthError::Unauthorized => AppError::unauthorized("Invalid username or password"),
            // Token failures keep their reason for the log only
            AuthError::InvalidToken(_) | AuthError::Expired => {
                AppError::unauthorized("Authentication required").with_details(err.to_string())
            }
            AuthError::Conflict(msg) => AppError::new(ErrorKind::Conflict, msg),
            AuthError::Internal(detail) => {
                AppError::new(ErrorKind::Internal, "Internal error").with_details(detail)
            }
        }
    }
}

// ============================================================================
// Error Response
// ============================================================================

/// JSON error response format
#[derive(Debug, Clone, serde::Serialize)]
pub struct ErrorResponse {
    /// Error type/code
    pub error: String,
    /// Human-readable message
    pub message: String,
    /// Error details (only in development, never for auth failures)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();

        let cfg = config();
        let status = self.kind.status_code();

        let message = match self.kind {
            ErrorKind::Internal if !cfg.expose_details => cfg.internal_error_message.clone(),
            _ => self.message,
        };
        let details = match self.kind {
            ErrorKind::Unauthorized => None,
            kind if cfg.expose_details || kind.expose_details() => self.details,
            _ => None,
        };

        let response = ErrorResponse {
            error: self.kind.to_string(),
            message,
            details,
        };

        (status, Json(response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_status_codes() {
        assert_eq!(ErrorKind::BadRequest.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorKind::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorKind::Validation.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ErrorKind::Internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_token_failures_collapse_to_unauthorized() {
        let expired: AppError = AuthError::Expired.into();
        let tampered: AppError = AuthError::invalid_token("InvalidSignature").into();

        assert_eq!(expired.kind, ErrorKind::Unauthorized);
        assert_eq!(tampered.kind, ErrorKind::Unauthorized);
        assert_eq!(expired.message, tampered.message);

        // Reasons survive for diagnostics
        assert_eq!(expired.details.as_deref(), Some("Token expired"));
        assert!(tampered.details.unwrap().contains("InvalidSignature"));
    }

    #[test]
    fn test_core_error_mapping() {
        assert_eq!(AppError::from(AuthError::NotFound).kind, ErrorKind::NotFound);
        assert_eq!(AppError::from(AuthError::Unauthorized).kind, ErrorKind::Unauthorized);
        assert_eq!(
            AppError::from(AuthError::Conflict("taken".into())).kind,
            ErrorKind::Conflict
        );
        assert_eq!(
            AppError::from(AuthError::internal("boom")).kind,
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_config_modes() {
        assert!(!ErrorConfig::production().expose_details);
        assert!(ErrorConfig::development().expose_details);
        assert!(!ErrorConfig::for_environment(Environment::Staging).expose_details);
        assert!(ErrorConfig::for_environment(Environment::Test).expose_details);
    }

    #[test]
    fn test_error_display() {
        let err = AppError::not_found("User not found");
        assert_eq!(format!("{}", err), "not_found: User not found");
    }
}

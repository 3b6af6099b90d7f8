//! Security Event Logging
//!
//! Structured log records for authentication and account changes.
//!
//! # Usage
//!
//! ```ignore
//! use gatekeeper::observability::SecurityEvent;
//! use gatekeeper::security_event;
//!
//! security_event!(
//!     SecurityEvent::AuthenticationFailure,
//!     username = %username,
//!     reason = "wrong_secret",
//!     "Authentication failed"
//! );
//! ```
//!
//! Never pass a secret or a raw token as a field.

use std::fmt;

/// Security event categories for audit logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEvent {
    // Authentication events
    /// Successful sign-in
    AuthenticationSuccess,
    /// Failed sign-in attempt
    AuthenticationFailure,
    /// User logout
    Logout,
    /// Session token issued
    SessionCreated,

    // Authorization events
    /// Protected call let through by the gate
    AccessGranted,
    /// Protected call refused by the gate
    AccessDenied,

    // User management events
    /// New user registered
    UserRegistered,
    /// User record modified
    UserModified,
    /// User record deleted
    UserDeleted,

    // System events
    /// Service started
    SystemStartup,
    /// Service shutting down
    SystemShutdown,
}

impl SecurityEvent {
    /// Get the event category for filtering/grouping
    pub fn category(&self) -> &'static str {
        match self {
            Self::AuthenticationSuccess
            | Self::AuthenticationFailure
            | Self::Logout
            | Self::SessionCreated => "authentication",

            Self::AccessGranted | Self::AccessDenied => "authorization",

            Self::UserRegistered | Self::UserModified | Self::UserDeleted => "user_management",

            Self::SystemStartup | Self::SystemShutdown => "system",
        }
    }

    /// Get the severity level for the event
    pub fn severity(&self) -> Severity {
        match self {
            Self::AuthenticationFailure | Self::AccessDenied => Severity::High,

            Self::AuthenticationSuccess
            | Self::UserRegistered
            | Self::UserModified
            | Self::UserDeleted => Severity::Medium,

            Self::AccessGranted
            | Self::Logout
            | Self::SessionCreated
            | Self::SystemStartup
            | Self::SystemShutdown => Severity::Low,
        }
    }

    /// Get the event name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Self::AuthenticationSuccess => "authentication_success",
            Self::AuthenticationFailure => "authentication_failure",
            Self::Logout => "logout",
            Self::SessionCreated => "session_created",
            Self::AccessGranted => "access_granted",
            Self::AccessDenied => "access_denied",
            Self::UserRegistered => "user_registered",
            Self::UserModified => "user_modified",
            Self::UserDeleted => "user_deleted",
            Self::SystemStartup => "system_startup",
            Self::SystemShutdown => "system_shutdown",
        }
    }
}

impl fmt::Display for SecurityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Event severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Routine operations
    Low,
    /// Important state changes
    Medium,
    /// Security-relevant failures
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Log a security event with structured fields.
///
/// Adds `security_event`, `category` and `severity` fields and picks the
/// tracing level from the event's severity.
///
/// ```ignore
/// security_event!(
///     SecurityEvent::UserRegistered,
///     user_id = %identity.id,
///     "User registered"
/// );
/// ```
#[macro_export]
macro_rules! security_event {
    ($event:expr, $($field:tt)*) => {{
        let event = $event;
        let category = event.category();
        let event_name = event.name();

        match event.severity() {
            $crate::observability::Severity::High => {
                ::tracing::warn!(
                    security_event = event_name,
                    category = category,
                    severity = "high",
                    $($field)*
                );
            }
            $crate::observability::Severity::Medium => {
                ::tracing::info!(
                    security_event = event_name,
                    category = category,
                    severity = "medium",
                    $($field)*
                );
            }
            $crate::observability::Severity::Low => {
                ::tracing::debug!(
                    security_event = event_name,
                    category = category,
                    severity = "low",
                    $($field)*
                );
            }
        }
    }};
}

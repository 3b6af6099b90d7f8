//! Logging and security event reporting
//!
//! Application code logs through `tracing` macros and the
//! [`security_event!`](crate::security_event) macro; this module installs the
//! subscriber once at startup.
//!
//! # Usage
//!
//! ```ignore
//! use gatekeeper::observability::{ObservabilityConfig, init};
//!
//! let config = ObservabilityConfig::from_env();
//! init(&config)?;
//! ```

mod config;
mod events;
mod providers;

pub use config::{LogFormat, ObservabilityConfig};
pub use events::{SecurityEvent, Severity};

use tracing::info;

/// Install the tracing subscriber.
///
/// Must be called once, before any logging occurs.
///
/// # Errors
///
/// Returns an error if the log filter is invalid or a global subscriber
/// is already installed.
pub fn init(config: &ObservabilityConfig) -> Result<(), ObservabilityError> {
    providers::init_tracing(config)?;

    info!(
        log_format = ?config.log_format,
        log_filter = %config.log_filter,
        "Observability initialized"
    );

    Ok(())
}

/// Observability initialization errors
#[derive(Debug, thiserror::Error)]
pub enum ObservabilityError {
    /// Invalid configuration
    #[error("Observability config error: {0}")]
    Config(String),
    /// Subscriber installation failed
    #[error("Provider error: {0}")]
    Provider(String),
}

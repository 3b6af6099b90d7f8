//! Service configuration
//!
//! Loaded once at startup from environment variables and shared read-only
//! (behind an `Arc`) for the lifetime of the process.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::parse::{parse_duration, ParseDurationError};

/// Default session token lifetime when `JWT_EXPIRES_IN` is unset.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(5 * 60);

/// Deployment environment.
///
/// Controls whether the operation catalogue is served and how much error
/// detail is returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
    Staging,
}

impl Environment {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
            Self::Staging => "staging",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            "staging" => Ok(Self::Staging),
            other => Err(ConfigError::Invalid {
                var: "NODE_ENV",
                message: format!(
                    "'{}' is not one of development, production, test, staging",
                    other
                ),
            }),
        }
    }
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required variable is not set
    #[error("{var} environment variable required")]
    Missing { var: &'static str },

    /// Variable is set but its value is unusable
    #[error("Invalid {var}: {message}")]
    Invalid { var: &'static str, message: String },

    /// Token lifetime could not be parsed
    #[error("Invalid JWT_EXPIRES_IN: {0}")]
    TokenTtl(#[from] ParseDurationError),
}

/// Application configuration.
///
/// # Example
///
/// ```ignore
/// use gatekeeper::AppConfig;
///
/// // Load from environment variables
/// let config = AppConfig::from_env()?;
///
/// // Or build programmatically
/// let config = AppConfig::builder()
///     .jwt_secret("a-long-random-signing-secret")
///     .token_ttl(Duration::from_secs(600))
///     .port(8080)
///     .build();
/// ```
#[derive(Clone)]
pub struct AppConfig {
    /// Deployment environment
    pub environment: Environment,

    /// Listening port
    pub port: u16,

    /// HMAC secret used to sign session tokens
    pub jwt_secret: String,

    /// Session token lifetime
    pub token_ttl: Duration,

    /// Per-request timeout enforced by the service layers
    pub request_timeout: Duration,

    /// Maximum request body size in bytes
    pub max_request_size: usize,
}

// Hand-written so the signing secret never reaches a log line.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("environment", &self.environment)
            .field("port", &self.port)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("request_timeout", &self.request_timeout)
            .field("max_request_size", &self.max_request_size)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            port: 3000,
            jwt_secret: String::new(),
            token_ttl: DEFAULT_TOKEN_TTL,
            request_timeout: Duration::from_secs(30),
            max_request_size: 64 * 1024,
        }
    }
}

impl AppConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `NODE_ENV` or `APP_ENV`: development, production, test, staging (default: development)
    /// - `PORT`: listening port, 0-65535 (required)
    /// - `JWT_SECRET`: token signing secret (required)
    /// - `JWT_EXPIRES_IN`: token lifetime in whole seconds, e.g. "5m", "1.5h", "2 days" (default: "5m")
    /// - `REQUEST_TIMEOUT`: e.g. "30s" (default: "30s")
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let environment = match lookup("NODE_ENV").or_else(|| lookup("APP_ENV")) {
            Some(value) => value.parse()?,
            None => Environment::default(),
        };

        let port = lookup("PORT")
            .ok_or(ConfigError::Missing { var: "PORT" })?
            .trim()
            .parse::<u16>()
            .map_err(|e| ConfigError::Invalid {
                var: "PORT",
                message: format!("must be an integer between 0 and 65535 ({})", e),
            })?;

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing { var: "JWT_SECRET" })?;

        let token_ttl = match lookup("JWT_EXPIRES_IN") {
            Some(s) => parse_duration(&s)?,
            None => DEFAULT_TOKEN_TTL,
        };
        if token_ttl < Duration::from_secs(1) {
            return Err(ConfigError::Invalid {
                var: "JWT_EXPIRES_IN",
                message: "must be at least one second".to_string(),
            });
        }
        // Token timestamps have one-second resolution
        if token_ttl.subsec_nanos() != 0 {
            return Err(ConfigError::Invalid {
                var: "JWT_EXPIRES_IN",
                message: format!("must be a whole number of seconds (got {:?})", token_ttl),
            });
        }

        let request_timeout = match lookup("REQUEST_TIMEOUT") {
            Some(s) => parse_duration(&s).map_err(|e| ConfigError::Invalid {
                var: "REQUEST_TIMEOUT",
                message: e.to_string(),
            })?,
            None => defaults.request_timeout,
        };

        Ok(Self {
            environment,
            port,
            jwt_secret,
            token_ttl,
            request_timeout,
            max_request_size: defaults.max_request_size,
        })
    }

    /// Create a new builder for programmatic configuration.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Whether the operation catalogue at `/api` is exposed.
    pub fn docs_enabled(&self) -> bool {
        self.environment == Environment::Development
    }
}

/// Builder for AppConfig
#[derive(Debug, Clone, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn environment(mut self, environment: Environment) -> Self {
        self.config.environment = environment;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.jwt_secret = secret.into();
        self
    }

    pub fn token_ttl(mut self, ttl: Duration) -> Self {
        self.config.token_ttl = ttl;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn max_request_size(mut self, size: usize) -> Self {
        self.config.max_request_size = size;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

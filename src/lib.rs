//! # Gatekeeper
//!
//! Minimal identity service for Axum applications.
//!
//! Users register with a username and password, exchange those credentials
//! for a short-lived signed session token, and present the token as a
//! bearer credential on protected operations. Sessions are stateless: the
//! server keeps no session table, so a token stays valid until it expires.
//!
//! ## Components
//!
//! - **Identity store** ([`store`]): in-memory users keyed by id, unique by username
//! - **Id generation** ([`ids`]): injectable; UUID v4 in production
//! - **Credentials** ([`credentials`]): Argon2id hashing, constant-time checks
//! - **Sessions** ([`session`]): HS256 JWTs with exact expiry
//! - **Authorization gate** ([`gate`]): per-operation public/protected marker
//! - **Operations** ([`service`], [`api`]): sign-in, register, profile, logout
//!
//! ## Quick Start
//!
//! ```ignore
//! use gatekeeper::{api, AppConfig, ServiceRouter};
//! use gatekeeper::observability::{self, ObservabilityConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     observability::init(&ObservabilityConfig::from_env())?;
//!
//!     let config = AppConfig::from_env()?;
//!     let app = api::router(api::AppState::from_config(config.clone()))
//!         .with_service_layers(&config);
//!
//!     let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gate;
pub mod ids;
mod layers;
pub mod observability;
mod parse;
pub mod service;
pub mod session;
pub mod store;
pub mod validation;

// Re-exports
pub use config::{AppConfig, AppConfigBuilder, ConfigError, Environment};
pub use error::{AppError, AuthError, AuthResult, ErrorConfig, ErrorKind};
pub use gate::{Access, Caller, Gate};
pub use ids::{IdGenerator, SequentialIdGenerator, UuidV4Generator};
pub use layers::ServiceRouter;
pub use parse::{parse_duration, ParseDurationError};
pub use service::AccountService;
pub use session::{IssuedToken, SessionClaims, SessionIssuer};
pub use store::{Identity, UserStore, UserUpdate};

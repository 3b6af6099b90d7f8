//! Service layer application for Axum routers
//!
//! Provides the `ServiceRouter` trait that wraps the operation router with
//! the transport concerns every call shares.

use axum::http::{header, HeaderValue, StatusCode};
use axum::Router;
use tower_http::{
    limit::RequestBodyLimitLayer, set_header::SetResponseHeaderLayer, timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;

/// Extension trait for applying service layers to an Axum Router.
///
/// # Example
///
/// ```ignore
/// use gatekeeper::{api, AppConfig, ServiceRouter};
///
/// let config = AppConfig::from_env()?;
/// let app = api::router(api::AppState::from_config(config.clone()))
///     .with_service_layers(&config);
/// ```
pub trait ServiceRouter {
    /// Layers, outermost first:
    /// 1. TraceLayer
    /// 2. Response headers (`no-store`, `nosniff`)
    /// 3. Request body limit
    /// 4. Timeout (innermost)
    fn with_service_layers(self, config: &AppConfig) -> Self;
}

impl<S> ServiceRouter for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_service_layers(self, config: &AppConfig) -> Self {
        self.layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(RequestBodyLimitLayer::new(config.max_request_size))
        // Responses carry tokens and identities; never cache them
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(TraceLayer::new_for_http())
    }
}

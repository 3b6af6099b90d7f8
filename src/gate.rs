//! Authorization gate
//!
//! Every operation is declared [`Access::Public`] or [`Access::Protected`]
//! when it is registered. Protected calls must carry
//! `Authorization: Bearer <token>`; the gate verifies the token and attaches
//! the resulting [`SessionClaims`] to the request before any handler runs.
//! Handlers learn who the caller is only through the [`Caller`] extractor,
//! never from the request body.
//!
//! # Usage
//!
//! ```ignore
//! use axum::{middleware, routing::get, Router};
//! use gatekeeper::gate::{require_session, Caller, Gate};
//!
//! async fn whoami(caller: Caller) -> String {
//!     caller.id().to_string()
//! }
//!
//! let app = Router::new()
//!     .route("/whoami", get(whoami))
//!     .route_layer(middleware::from_fn_with_state(gate, require_session));
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::Serialize;

use crate::error::{AppError, AuthError, AuthResult};
use crate::observability::SecurityEvent;
use crate::session::{SessionClaims, SessionIssuer};

/// Whether an operation needs a verified session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Public,
    Protected,
}

/// Extract the token from an `Authorization` header value.
///
/// The scheme match is case-insensitive; anything other than a non-empty
/// bearer credential yields `None`.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Decides whether a call may proceed.
#[derive(Debug, Clone)]
pub struct Gate {
    issuer: Arc<SessionIssuer>,
}

impl Gate {
    pub fn new(issuer: Arc<SessionIssuer>) -> Self {
        Self { issuer }
    }

    /// Public calls pass with no claims. Protected calls need a verifiable
    /// bearer token; its claims are returned.
    pub fn authorize(
        &self,
        access: Access,
        authorization: Option<&str>,
    ) -> AuthResult<Option<SessionClaims>> {
        match access {
            Access::Public => Ok(None),
            Access::Protected => self.verify_bearer(authorization).map(Some),
        }
    }

    /// The protected path: a missing or non-bearer header is `Unauthorized`,
    /// otherwise the token's own verification result.
    pub fn verify_bearer(&self, authorization: Option<&str>) -> AuthResult<SessionClaims> {
        let token = authorization
            .and_then(bearer_token)
            .ok_or(AuthError::Unauthorized)?;
        self.issuer.verify(token)
    }
}

/// Middleware for protected routes.
///
/// Rejects with 401 before the handler is invoked; on success the claims
/// are stored in the request extensions for [`Caller`].
pub async fn require_session(
    State(gate): State<Gate>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match gate.verify_bearer(authorization) {
        Ok(claims) => {
            crate::security_event!(
                SecurityEvent::AccessGranted,
                user_id = %claims.sub,
                path = %request.uri().path(),
                "Session verified"
            );
            request.extensions_mut().insert(claims);
            Ok(next.run(request).await)
        }
        Err(err) => {
            crate::security_event!(
                SecurityEvent::AccessDenied,
                path = %request.uri().path(),
                reason = %err,
                "Protected call rejected"
            );
            Err(err.into())
        }
    }
}

/// The verified caller of a protected operation.
#[derive(Debug, Clone)]
pub struct Caller(pub SessionClaims);

impl Caller {
    /// Subject id from the verified token.
    pub fn id(&self) -> &str {
        self.0.user_id()
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionClaims>()
            .cloned()
            .map(Caller)
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}

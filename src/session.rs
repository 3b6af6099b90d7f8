//! Stateless session tokens
//!
//! Sessions are HS256-signed JWTs. The server keeps no session table: a
//! token is valid exactly when its signature checks out against the
//! process-wide key and its expiry has not passed.
//!
//! Expiry is checked here rather than by `jsonwebtoken` so the comparison
//! is exact (no leeway) and can be evaluated against an explicit clock.
//!
//! # Usage
//!
//! ```ignore
//! use gatekeeper::session::SessionIssuer;
//!
//! let issuer = SessionIssuer::new(&config.jwt_secret, config.token_ttl);
//! let issued = issuer.issue(&identity)?;
//! let claims = issuer.verify(&issued.token)?;
//! assert_eq!(claims.sub, identity.id);
//! ```

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};
use crate::store::Identity;

/// Decoded session token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user id)
    pub sub: String,
    /// Username at issue time
    pub username: String,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration (seconds since epoch)
    pub exp: i64,
    /// Token id
    pub jti: String,
}

impl SessionClaims {
    pub fn user_id(&self) -> &str {
        &self.sub
    }

    /// Expired strictly after `exp`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.exp
    }
}

/// A freshly signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token: String,
    /// Seconds until expiry
    pub expires_in: u64,
}

/// Signs and verifies session tokens with one immutable key.
#[derive(Clone)]
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Issue a token valid from now for the configured ttl.
    pub fn issue(&self, identity: &Identity) -> AuthResult<IssuedToken> {
        self.issue_at(identity, Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `now` (seconds since epoch).
    pub fn issue_at(&self, identity: &Identity, now: i64) -> AuthResult<IssuedToken> {
        // Round a fractional lifetime up so `exp` and `expires_in` agree
        let ttl_secs = self.ttl.as_secs() + u64::from(self.ttl.subsec_nanos() > 0);
        let claims = SessionClaims {
            sub: identity.id.clone(),
            username: identity.username.clone(),
            iat: now,
            exp: now.saturating_add(ttl_secs as i64),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::internal(format!("Token creation failed: {}", e)))?;

        Ok(IssuedToken {
            token,
            expires_in: ttl_secs,
        })
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> AuthResult<SessionClaims> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify a token as if the current time were `now`.
    ///
    /// Signature and structure are checked before expiry, so a tampered
    /// token is always `InvalidToken`, never `Expired`.
    pub fn verify_at(&self, token: &str, now: i64) -> AuthResult<SessionClaims> {
        let claims = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::invalid_token(format!("{:?}", e.kind())))?;

        if claims.is_expired_at(now) {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }
}

impl fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("algorithm", &"HS256")
            .field("ttl", &self.ttl)
            .finish()
    }
}

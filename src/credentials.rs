//! Credential validation
//!
//! How a secret is stored and compared is a [`SecretHasher`] capability, so
//! the validator and the account service work the same with Argon2id hashes
//! (the default) or plaintext secrets (tests, fixtures).
//!
//! ## Security Patterns
//!
//! - **Argon2id**: secrets are stored as PHC strings with a per-record salt
//! - **Constant-Time Comparison**: plaintext secrets are compared with
//!   `subtle` so response time does not reveal the matching prefix

use std::fmt;
use std::sync::Arc;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;

use crate::error::{AuthError, AuthResult};
use crate::store::{Identity, UserStore};

/// Turns a presented secret into its stored form and checks candidates
/// against stored values.
pub trait SecretHasher: Send + Sync {
    /// Produce the value to persist for `secret`.
    fn hash(&self, secret: &str) -> AuthResult<String>;

    /// Whether `presented` matches the persisted `stored` value.
    fn verify(&self, presented: &str, stored: &str) -> bool;
}

/// Argon2id hashing with PHC-string output.
#[derive(Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Library-default Argon2id cost parameters.
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Custom cost parameters (memory KiB, iterations, parallelism).
    pub fn with_cost(m_cost: u32, t_cost: u32, p_cost: u32) -> AuthResult<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| AuthError::internal(format!("Invalid Argon2 parameters: {}", e)))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argon2Hasher")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .field("p_cost", &self.params.p_cost())
            .finish()
    }
}

impl SecretHasher for Argon2Hasher {
    fn hash(&self, secret: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::internal(format!("Password hashing failed: {}", e)))
    }

    fn verify(&self, presented: &str, stored: &str) -> bool {
        // Cost parameters come from the stored PHC string
        PasswordHash::new(stored)
            .map(|parsed| {
                self.argon2()
                    .verify_password(presented.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

/// Stores secrets verbatim; comparison is constant-time.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextHasher;

impl SecretHasher for PlaintextHasher {
    fn hash(&self, secret: &str) -> AuthResult<String> {
        Ok(secret.to_string())
    }

    fn verify(&self, presented: &str, stored: &str) -> bool {
        presented.as_bytes().ct_eq(stored.as_bytes()).into()
    }
}

/// Resolves a username/secret pair to an identity.
#[derive(Clone)]
pub struct CredentialValidator {
    store: Arc<UserStore>,
    hasher: Arc<dyn SecretHasher>,
}

impl CredentialValidator {
    pub fn new(store: Arc<UserStore>, hasher: Arc<dyn SecretHasher>) -> Self {
        Self { store, hasher }
    }

    /// `NotFound` for an unknown username, `Unauthorized` for a wrong secret.
    pub fn validate(&self, username: &str, secret: &str) -> AuthResult<Identity> {
        let user = self.store.find_by_username(username)?;
        if !self.hasher.verify(secret, &user.secret) {
            return Err(AuthError::Unauthorized);
        }
        Ok(user.identity())
    }
}

//! Account operations
//!
//! The use-cases exposed to the transport layer. Caller ids passed in here
//! always come from verified session claims. Everything returned is an
//! [`Identity`]; secrets never leave this module.

use std::sync::Arc;

use crate::credentials::{CredentialValidator, SecretHasher};
use crate::error::{AuthError, AuthResult};
use crate::observability::SecurityEvent;
use crate::security_event;
use crate::session::{IssuedToken, SessionIssuer};
use crate::store::{Identity, UserStore, UserUpdate};

/// Registration, sign-in and profile management over one store.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<UserStore>,
    hasher: Arc<dyn SecretHasher>,
    validator: CredentialValidator,
    issuer: Arc<SessionIssuer>,
}

impl AccountService {
    pub fn new(
        store: Arc<UserStore>,
        hasher: Arc<dyn SecretHasher>,
        issuer: Arc<SessionIssuer>,
    ) -> Self {
        let validator = CredentialValidator::new(store.clone(), hasher.clone());
        Self {
            store,
            hasher,
            validator,
            issuer,
        }
    }

    pub fn issuer(&self) -> &Arc<SessionIssuer> {
        &self.issuer
    }

    /// The caller's own identity.
    pub fn get_me(&self, caller_id: &str) -> AuthResult<Identity> {
        Ok(self.store.find_by_id(caller_id)?.identity())
    }

    /// Validate credentials and issue a session token.
    pub fn sign_in(&self, username: &str, secret: &str) -> AuthResult<IssuedToken> {
        let identity = match self.validator.validate(username, secret) {
            Ok(identity) => identity,
            Err(err) => {
                let reason = match err {
                    AuthError::NotFound => "unknown_user",
                    AuthError::Unauthorized => "wrong_secret",
                    _ => "error",
                };
                security_event!(
                    SecurityEvent::AuthenticationFailure,
                    username = %username,
                    reason = reason,
                    "Authentication failed"
                );
                return Err(err);
            }
        };

        let issued = self.issuer.issue(&identity)?;

        security_event!(
            SecurityEvent::AuthenticationSuccess,
            user_id = %identity.id,
            username = %identity.username,
            "User authenticated"
        );
        security_event!(
            SecurityEvent::SessionCreated,
            user_id = %identity.id,
            expires_in = issued.expires_in,
            "Session token issued"
        );

        Ok(issued)
    }

    /// Create an account. Fails with `Conflict` if the username is taken.
    pub fn register(&self, username: &str, secret: &str) -> AuthResult<Identity> {
        let stored = self.hasher.hash(secret)?;
        let identity = self.store.create(username, &stored)?.identity();

        security_event!(
            SecurityEvent::UserRegistered,
            user_id = %identity.id,
            username = %identity.username,
            "User registered"
        );

        Ok(identity)
    }

    /// Liveness check only; tokens stay valid until they expire.
    pub fn logout(&self, caller_id: &str) -> AuthResult<bool> {
        self.store.find_by_id(caller_id)?;

        security_event!(SecurityEvent::Logout, user_id = %caller_id, "User logged out");

        Ok(true)
    }

    /// Merge the supplied fields into the caller's record.
    ///
    /// A new secret is hashed before it is stored.
    pub fn update_me(&self, caller_id: &str, update: UserUpdate) -> AuthResult<Identity> {
        let secret_changed = update.secret.is_some();
        let update = UserUpdate {
            username: update.username,
            secret: update
                .secret
                .map(|secret| self.hasher.hash(&secret))
                .transpose()?,
        };

        let identity = self.store.update(caller_id, update)?.identity();

        security_event!(
            SecurityEvent::UserModified,
            user_id = %identity.id,
            secret_changed = secret_changed,
            "User profile updated"
        );

        Ok(identity)
    }

    /// Every registered identity, ordered by username.
    pub fn list_users(&self) -> Vec<Identity> {
        self.store.list().iter().map(|u| u.identity()).collect()
    }

    pub fn get_user(&self, id: &str) -> AuthResult<Identity> {
        Ok(self.store.find_by_id(id)?.identity())
    }

    /// Remove the caller's own record. Outstanding tokens for it keep
    /// verifying until expiry, but every lookup by id now fails `NotFound`.
    pub fn delete_me(&self, caller_id: &str) -> AuthResult<()> {
        self.store.delete(caller_id)?;

        security_event!(SecurityEvent::UserDeleted, user_id = %caller_id, "User deleted");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::credentials::{Argon2Hasher, PlaintextHasher};
    use crate::ids::SequentialIdGenerator;

    fn service_with(hasher: Arc<dyn SecretHasher>) -> AccountService {
        let store = Arc::new(UserStore::new(Arc::new(SequentialIdGenerator::default())));
        let issuer = Arc::new(SessionIssuer::new("service-secret", Duration::from_secs(300)));
        AccountService::new(store, hasher, issuer)
    }

    fn service() -> AccountService {
        service_with(Arc::new(PlaintextHasher))
    }

    #[test]
    fn test_register_then_get_me() {
        let service = service();
        let registered = service.register("alice", "Password1!").unwrap();

        assert_eq!(registered.username, "alice");
        assert_eq!(service.get_me(&registered.id).unwrap(), registered);
    }

    #[test]
    fn test_register_duplicate_is_conflict() {
        let service = service();
        service.register("alice", "Password1!").unwrap();
        assert!(matches!(
            service.register("alice", "Other1!"),
            Err(AuthError::Conflict(_))
        ));
    }

    #[test]
    fn test_sign_in_issues_verifiable_token() {
        let service = service();
        let alice = service.register("alice", "Password1!").unwrap();

        let issued = service.sign_in("alice", "Password1!").unwrap();
        let claims = service.issuer().verify(&issued.token).unwrap();
        assert_eq!(claims.sub, alice.id);
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn test_sign_in_failures() {
        let service = service();
        service.register("alice", "Password1!").unwrap();

        assert_eq!(service.sign_in("alice", "wrong"), Err(AuthError::Unauthorized));
        assert_eq!(service.sign_in("bob", "Password1!"), Err(AuthError::NotFound));
    }

    #[test]
    fn test_logout_and_missing_caller() {
        let service = service();
        let alice = service.register("alice", "Password1!").unwrap();

        assert_eq!(service.logout(&alice.id), Ok(true));
        assert_eq!(service.logout("ghost"), Err(AuthError::NotFound));
        assert_eq!(service.get_me("ghost"), Err(AuthError::NotFound));
    }

    #[test]
    fn test_update_me_username_and_secret() {
        let service = service();
        let alice = service.register("alice", "Password1!").unwrap();

        let renamed = service
            .update_me(&alice.id, UserUpdate::username("alicia"))
            .unwrap();
        assert_eq!(renamed.id, alice.id);
        assert_eq!(renamed.username, "alicia");
        // Secret untouched by a username-only update
        assert!(service.sign_in("alicia", "Password1!").is_ok());

        let update = UserUpdate {
            username: None,
            secret: Some("NewPassword2!".into()),
        };
        service.update_me(&alice.id, update).unwrap();
        assert_eq!(service.sign_in("alicia", "Password1!"), Err(AuthError::Unauthorized));
        assert!(service.sign_in("alicia", "NewPassword2!").is_ok());

        assert_eq!(
            service.update_me("ghost", UserUpdate::default()),
            Err(AuthError::NotFound)
        );
    }

    #[test]
    fn test_secrets_are_hashed_at_rest() {
        let store = Arc::new(UserStore::new(Arc::new(SequentialIdGenerator::default())));
        let issuer = Arc::new(SessionIssuer::new("service-secret", Duration::from_secs(300)));
        let hasher = Arc::new(Argon2Hasher::with_cost(8, 1, 1).unwrap());
        let service = AccountService::new(store.clone(), hasher, issuer);

        let alice = service.register("alice", "Password1!").unwrap();
        let stored = store.find_by_id(&alice.id).unwrap().secret;
        assert_ne!(stored, "Password1!");
        assert!(service.sign_in("alice", "Password1!").is_ok());
    }

    #[test]
    fn test_user_listing_and_deletion() {
        let service = service();
        let bob = service.register("bob", "pw").unwrap();
        let alice = service.register("alice", "pw").unwrap();

        assert_eq!(service.list_users(), vec![alice.clone(), bob.clone()]);
        assert_eq!(service.get_user(&bob.id).unwrap(), bob);

        service.delete_me(&bob.id).unwrap();
        assert_eq!(service.get_user(&bob.id), Err(AuthError::NotFound));
        assert_eq!(service.delete_me(&bob.id), Err(AuthError::NotFound));
        assert_eq!(service.list_users(), vec![alice]);
    }
}

//! In-memory identity store
//!
//! Owns every user record, keyed by id, behind a single lock. There is no
//! persistence: the store lives as long as the process.
//!
//! Usernames are unique. `create` and `update` refuse to hand a username to a
//! second record, so `find_by_username` has at most one match.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};
use crate::ids::IdGenerator;

/// A stored user record, secret included.
///
/// Deliberately not `Serialize`: convert to [`Identity`] before anything
/// leaves the service.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub secret: String,
}

impl User {
    /// The record minus its secret.
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id.clone(),
            username: self.username.clone(),
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// A user record without its secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub username: String,
}

/// Partial update; `None` fields keep their current value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub secret: Option<String>,
}

impl UserUpdate {
    pub fn username(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            secret: None,
        }
    }
}

impl fmt::Debug for UserUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserUpdate")
            .field("username", &self.username)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    // username -> id
    usernames: HashMap<String, String>,
}

/// Thread-safe user table.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use gatekeeper::{UserStore, UuidV4Generator};
///
/// let store = UserStore::new(Arc::new(UuidV4Generator));
/// let user = store.create("alice", "hashed-secret")?;
/// assert_eq!(store.find_by_id(&user.id)?, user);
/// ```
pub struct UserStore {
    ids: Arc<dyn IdGenerator>,
    inner: RwLock<Inner>,
}

impl UserStore {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            ids,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Insert a new record with a freshly generated id.
    ///
    /// Fails with `Conflict` if the username is taken.
    pub fn create(&self, username: &str, secret: &str) -> AuthResult<User> {
        let mut inner = self.inner.write();
        if inner.usernames.contains_key(username) {
            return Err(AuthError::Conflict(format!(
                "Username '{}' is already taken",
                username
            )));
        }

        let user = User {
            id: self.ids.generate(),
            username: username.to_string(),
            secret: secret.to_string(),
        };
        inner
            .usernames
            .insert(user.username.clone(), user.id.clone());
        inner.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    pub fn find_by_id(&self, id: &str) -> AuthResult<User> {
        self.inner
            .read()
            .users
            .get(id)
            .cloned()
            .ok_or(AuthError::NotFound)
    }

    /// Exact, case-sensitive match.
    pub fn find_by_username(&self, username: &str) -> AuthResult<User> {
        let inner = self.inner.read();
        inner
            .usernames
            .get(username)
            .and_then(|id| inner.users.get(id))
            .cloned()
            .ok_or(AuthError::NotFound)
    }

    /// Merge the supplied fields into the record and return the result.
    pub fn update(&self, id: &str, update: UserUpdate) -> AuthResult<User> {
        let mut inner = self.inner.write();
        let current = inner.users.get(id).ok_or(AuthError::NotFound)?;

        if let Some(username) = update.username.as_deref() {
            if username != current.username {
                if let Some(owner) = inner.usernames.get(username) {
                    if owner != id {
                        return Err(AuthError::Conflict(format!(
                            "Username '{}' is already taken",
                            username
                        )));
                    }
                }
            }
        }

        let old_username = current.username.clone();
        let user = inner.users.get_mut(id).ok_or(AuthError::NotFound)?;
        if let Some(username) = update.username {
            user.username = username;
        }
        if let Some(secret) = update.secret {
            user.secret = secret;
        }
        let user = user.clone();

        if user.username != old_username {
            inner.usernames.remove(&old_username);
            inner
                .usernames
                .insert(user.username.clone(), user.id.clone());
        }
        Ok(user)
    }

    pub fn delete(&self, id: &str) -> AuthResult<()> {
        let mut inner = self.inner.write();
        let user = inner.users.remove(id).ok_or(AuthError::NotFound)?;
        inner.usernames.remove(&user.username);
        Ok(())
    }

    /// All records, ordered by username.
    pub fn list(&self) -> Vec<User> {
        let mut users: Vec<User> = self.inner.read().users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users
    }

    pub fn len(&self) -> usize {
        self.inner.read().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for UserStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserStore").field("len", &self.len()).finish()
    }
}

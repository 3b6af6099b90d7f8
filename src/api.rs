//! HTTP surface
//!
//! Every operation is listed once in [`OPERATIONS`] together with its
//! [`Access`] marker. [`router`] walks that table: public operations are
//! mounted as-is, protected ones behind [`require_session`].
//!
//! | Operation | Route | Access |
//! |-----------|-------|--------|
//! | sign-in   | `POST /auth/login`    | public |
//! | register  | `POST /auth/register` | public |
//! | get-me    | `GET /auth/me`        | protected |
//! | update-me | `PATCH /auth/me`      | protected |
//! | delete-me | `DELETE /auth/me`     | protected |
//! | logout    | `POST /auth/logout`   | protected |
//! | list-users | `GET /users`         | protected |
//! | get-user  | `GET /users/{id}`     | protected |
//! | health    | `GET /health`         | public |
//! | catalogue | `GET /api`            | public, development only |

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, patch, post, MethodRouter},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::credentials::{Argon2Hasher, SecretHasher};
use crate::error::{AppError, AuthResult, ErrorKind};
use crate::gate::{require_session, Access, Caller, Gate};
use crate::ids::{IdGenerator, UuidV4Generator};
use crate::service::AccountService;
use crate::session::{IssuedToken, SessionIssuer};
use crate::store::{Identity, UserStore, UserUpdate};
use crate::validation::{validate_length, validate_required, Validate, ValidatedJson, ValidationError};

const MAX_USERNAME_LEN: usize = 64;
const MAX_SECRET_LEN: usize = 128;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub accounts: AccountService,
    pub gate: Gate,
}

impl AppState {
    /// Wire the store, hasher and issuer from explicit capabilities.
    pub fn new(
        config: AppConfig,
        ids: Arc<dyn IdGenerator>,
        hasher: Arc<dyn SecretHasher>,
    ) -> Self {
        let issuer = Arc::new(SessionIssuer::new(&config.jwt_secret, config.token_ttl));
        let store = Arc::new(UserStore::new(ids));
        Self {
            accounts: AccountService::new(store, hasher, issuer.clone()),
            gate: Gate::new(issuer),
            config: Arc::new(config),
        }
    }

    /// Production wiring: random UUIDs and Argon2id hashing.
    pub fn from_config(config: AppConfig) -> Self {
        Self::new(
            config,
            Arc::new(UuidV4Generator),
            Arc::new(Argon2Hasher::new()),
        )
    }
}

// ============================================================================
// Operation table
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    SignIn,
    Register,
    GetMe,
    UpdateMe,
    DeleteMe,
    Logout,
    ListUsers,
    GetUser,
    Health,
    Catalogue,
}

impl Operation {
    fn handler(self) -> MethodRouter<AppState> {
        match self {
            Self::SignIn => post(sign_in),
            Self::Register => post(register),
            Self::GetMe => get(get_me),
            Self::UpdateMe => patch(update_me),
            Self::DeleteMe => delete(delete_me),
            Self::Logout => post(logout),
            Self::ListUsers => get(list_users),
            Self::GetUser => get(get_user),
            Self::Health => get(health),
            Self::Catalogue => get(catalogue),
        }
    }
}

/// Static registration record for one operation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OperationSpec {
    pub operation: Operation,
    pub method: &'static str,
    pub path: &'static str,
    pub access: Access,
    pub summary: &'static str,
}

const fn op(
    operation: Operation,
    method: &'static str,
    path: &'static str,
    access: Access,
    summary: &'static str,
) -> OperationSpec {
    OperationSpec {
        operation,
        method,
        path,
        access,
        summary,
    }
}

pub static OPERATIONS: &[OperationSpec] = &[
    op(Operation::SignIn, "POST", "/auth/login", Access::Public, "Exchange credentials for a session token"),
    op(Operation::Register, "POST", "/auth/register", Access::Public, "Create an account"),
    op(Operation::GetMe, "GET", "/auth/me", Access::Protected, "Current identity"),
    op(Operation::UpdateMe, "PATCH", "/auth/me", Access::Protected, "Update username and/or password"),
    op(Operation::DeleteMe, "DELETE", "/auth/me", Access::Protected, "Delete the current account"),
    op(Operation::Logout, "POST", "/auth/logout", Access::Protected, "End the session on the client"),
    op(Operation::ListUsers, "GET", "/users", Access::Protected, "All identities"),
    op(Operation::GetUser, "GET", "/users/{id}", Access::Protected, "One identity by id"),
    op(Operation::Health, "GET", "/health", Access::Public, "Liveness check"),
    op(Operation::Catalogue, "GET", "/api", Access::Public, "This table"),
];

/// Build the router from [`OPERATIONS`].
pub fn router(state: AppState) -> Router {
    let mut public = Router::new();
    let mut protected = Router::new();

    for spec in OPERATIONS {
        if spec.operation == Operation::Catalogue && !state.config.docs_enabled() {
            continue;
        }
        match spec.access {
            Access::Public => public = public.route(spec.path, spec.operation.handler()),
            Access::Protected => protected = protected.route(spec.path, spec.operation.handler()),
        }
    }

    let protected =
        protected.route_layer(middleware::from_fn_with_state(state.gate.clone(), require_session));

    Router::new()
        .merge(public)
        .merge(protected)
        .with_state(state)
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsRequest {
    pub username: String,
    #[serde(alias = "secret")]
    pub password: String,
}

impl Validate for CredentialsRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_required(&self.username, "username")?;
        validate_length(&self.username, 1, MAX_USERNAME_LEN, "username")?;
        validate_length(&self.password, 1, MAX_SECRET_LEN, "password")?;
        Ok(())
    }
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, alias = "secret")]
    pub password: Option<String>,
}

impl Validate for UpdateProfileRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(username) = &self.username {
            validate_required(username, "username")?;
            validate_length(username, 1, MAX_USERNAME_LEN, "username")?;
        }
        if let Some(password) = &self.password {
            validate_length(password, 1, MAX_SECRET_LEN, "password")?;
        }
        Ok(())
    }
}

impl From<UpdateProfileRequest> for UserUpdate {
    fn from(req: UpdateProfileRequest) -> Self {
        UserUpdate {
            username: req.username,
            secret: req.password,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Run an account operation that hashes or verifies a secret on the
/// blocking pool, off the async workers.
async fn run_blocking<T, F>(op: F) -> Result<T, AppError>
where
    F: FnOnce() -> AuthResult<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(op).await.map_err(|e| {
        AppError::new(ErrorKind::Internal, "Internal error").with_details(e.to_string())
    })?;
    Ok(result?)
}

async fn sign_in(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CredentialsRequest>,
) -> Result<Json<IssuedToken>, AppError> {
    let accounts = state.accounts.clone();
    let issued = run_blocking(move || accounts.sign_in(&body.username, &body.password)).await?;
    Ok(Json(issued))
}

async fn register(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<Identity>), AppError> {
    let accounts = state.accounts.clone();
    let identity = run_blocking(move || accounts.register(&body.username, &body.password)).await?;
    Ok((StatusCode::CREATED, Json(identity)))
}

async fn get_me(State(state): State<AppState>, caller: Caller) -> Result<Json<Identity>, AppError> {
    Ok(Json(state.accounts.get_me(caller.id())?))
}

async fn update_me(
    State(state): State<AppState>,
    caller: Caller,
    ValidatedJson(body): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<Identity>, AppError> {
    let accounts = state.accounts.clone();
    let caller_id = caller.id().to_string();
    let identity = run_blocking(move || accounts.update_me(&caller_id, body.into())).await?;
    Ok(Json(identity))
}

async fn delete_me(State(state): State<AppState>, caller: Caller) -> Result<StatusCode, AppError> {
    state.accounts.delete_me(caller.id())?;
    Ok(StatusCode::NO_CONTENT)
}

async fn logout(State(state): State<AppState>, caller: Caller) -> Result<Json<bool>, AppError> {
    Ok(Json(state.accounts.logout(caller.id())?))
}

async fn list_users(State(state): State<AppState>) -> Json<Vec<Identity>> {
    Json(state.accounts.list_users())
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Identity>, AppError> {
    Ok(Json(state.accounts.get_user(&id)?))
}

async fn health() -> &'static str {
    "OK"
}

async fn catalogue() -> Json<&'static [OperationSpec]> {
    Json(OPERATIONS)
}

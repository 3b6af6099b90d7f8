//! End-to-end flows through the full router and service layers.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use gatekeeper::api::{self, AppState};
use gatekeeper::credentials::PlaintextHasher;
use gatekeeper::ids::SequentialIdGenerator;
use gatekeeper::{AppConfig, Environment, Identity, ServiceRouter, SessionIssuer};

const SECRET: &str = "e2e-signing-secret";

fn app() -> Router {
    let config = AppConfig::builder()
        .environment(Environment::Test)
        .jwt_secret(SECRET)
        .token_ttl(Duration::from_secs(300))
        .build();
    let state = AppState::new(
        config.clone(),
        Arc::new(SequentialIdGenerator::default()),
        Arc::new(PlaintextHasher),
    );
    api::router(state).with_service_layers(&config)
}

async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register_and_sign_in(app: &Router, username: &str, password: &str) -> (Value, String) {
    let credentials = json!({ "username": username, "password": password });

    let response = call(app, "POST", "/auth/register", None, Some(credentials.clone())).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let identity = json_body(response).await;

    let response = call(app, "POST", "/auth/login", None, Some(credentials)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let issued = json_body(response).await;
    assert_eq!(issued["expires_in"], 300);

    (identity, issued["token"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn sign_in_then_get_me_returns_identity_without_secret() {
    let app = app();
    let (identity, token) = register_and_sign_in(&app, "alice", "Password1!").await;

    let response = call(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let me = json_body(response).await;
    assert_eq!(me, json!({ "id": identity["id"], "username": "alice" }));
    assert!(me.get("password").is_none());
    assert!(me.get("secret").is_none());
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = app();
    register_and_sign_in(&app, "alice", "Password1!").await;

    let response = call(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "wrong" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let app = app();

    let response = call(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "nobody", "password": "Password1!" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = app();
    let (identity, _) = register_and_sign_in(&app, "alice", "Password1!").await;

    let identity: Identity = serde_json::from_value(identity).unwrap();
    let issuer = SessionIssuer::new(SECRET, Duration::from_secs(300));
    let stale = issuer
        .issue_at(&identity, Utc::now().timestamp() - 3_600)
        .unwrap()
        .token;

    let response = call(&app, "GET", "/auth/me", Some(&stale), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_other_key_is_rejected() {
    let app = app();
    let (identity, _) = register_and_sign_in(&app, "alice", "Password1!").await;

    let identity: Identity = serde_json::from_value(identity).unwrap();
    let forged = SessionIssuer::new("not-the-server-key", Duration::from_secs(300))
        .issue(&identity)
        .unwrap()
        .token;

    let response = call(&app, "GET", "/auth/me", Some(&forged), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_calls_need_a_token_public_calls_do_not() {
    let app = app();

    for (method, uri) in [
        ("GET", "/auth/me"),
        ("PATCH", "/auth/me"),
        ("DELETE", "/auth/me"),
        ("POST", "/auth/logout"),
        ("GET", "/users"),
        ("GET", "/users/user-1"),
    ] {
        let response = call(&app, method, uri, None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{} {}", method, uri);
    }

    let response = call(&app, "GET", "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unauthorized_body_does_not_leak_reason() {
    let app = app();

    let response = call(&app, "GET", "/auth/me", Some("garbage"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = json_body(response).await;
    assert_eq!(body["error"], "unauthorized");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn logout_returns_true_and_token_keeps_working() {
    let app = app();
    let (_, token) = register_and_sign_in(&app, "alice", "Password1!").await;

    let response = call(&app, "POST", "/auth/logout", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!(true));

    // Stateless sessions: nothing was revoked
    let response = call(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn update_me_changes_username_and_password() {
    let app = app();
    let (identity, token) = register_and_sign_in(&app, "alice", "Password1!").await;

    let response = call(
        &app,
        "PATCH",
        "/auth/me",
        Some(&token),
        Some(json!({ "username": "alicia", "password": "NewPassword2!" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["id"], identity["id"]);
    assert_eq!(updated["username"], "alicia");

    let old = call(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "alicia", "password": "Password1!" })),
    )
    .await;
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

    let new = call(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "alicia", "password": "NewPassword2!" })),
    )
    .await;
    assert_eq!(new.status(), StatusCode::OK);
}

#[tokio::test]
async fn update_me_onto_taken_username_conflicts() {
    let app = app();
    register_and_sign_in(&app, "bob", "Password1!").await;
    let (_, token) = register_and_sign_in(&app, "alice", "Password1!").await;

    let response = call(
        &app,
        "PATCH",
        "/auth/me",
        Some(&token),
        Some(json!({ "username": "bob" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn caller_id_comes_from_token_not_body() {
    let app = app();
    let (bob, _) = register_and_sign_in(&app, "bob", "Password1!").await;
    let (alice, token) = register_and_sign_in(&app, "alice", "Password1!").await;

    // Unknown fields such as an id are refused outright
    let response = call(
        &app,
        "PATCH",
        "/auth/me",
        Some(&token),
        Some(json!({ "id": bob["id"], "username": "mallory" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = call(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(json_body(response).await["id"], alice["id"]);
}

#[tokio::test]
async fn delete_me_invalidates_lookups() {
    let app = app();
    let (alice, token) = register_and_sign_in(&app, "alice", "Password1!").await;

    let response = call(&app, "DELETE", "/auth/me", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = call(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let uri = format!("/users/{}", alice["id"].as_str().unwrap());
    let response = call(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_users_is_sorted_and_secret_free() {
    let app = app();
    register_and_sign_in(&app, "carol", "pw").await;
    let (_, token) = register_and_sign_in(&app, "alice", "pw").await;

    let response = call(&app, "GET", "/users", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let users = json_body(response).await;
    let names: Vec<&str> = users
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["alice", "carol"]);
    assert!(users[0].get("secret").is_none());
}

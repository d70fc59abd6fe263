#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use caltrack_api::auth::jwt::{generate_access_token, JwtConfig};
use caltrack_api::config::ServerConfig;
use caltrack_api::router::build_app_router;
use caltrack_api::state::AppState;
use caltrack_core::points::memory::MemoryPointsStore;
use caltrack_core::points::store::PointsStore;
use caltrack_core::points::RewardAmounts;
use caltrack_core::roles::{ROLE_ADMIN, ROLE_USER};
use http_body_util::BodyExt;
use tower::ServiceExt;

const TEST_JWT_SECRET: &str = "caltrack-test-secret";

/// Build a test `ServerConfig` with safe defaults and default reward amounts.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        database_url: None,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
        rewards: RewardAmounts::default(),
    }
}

/// Full application router over a fresh in-memory store.
///
/// The store is returned so tests can inspect the ledger or inject failures.
pub fn build_test_app() -> (Router, MemoryPointsStore) {
    let store = MemoryPointsStore::new();
    let app = build_app_with_store(Arc::new(store.clone()), None);
    (app, store)
}

/// Full application router over an arbitrary store.
pub fn build_app_with_store(
    store: Arc<dyn PointsStore>,
    pool: Option<caltrack_db::DbPool>,
) -> Router {
    let config = test_config();
    let state = AppState::new(config.clone(), store, pool);
    build_app_router(state, &config)
}

pub fn user_token(user_id: i64) -> String {
    generate_access_token(user_id, ROLE_USER, &test_config().jwt).unwrap()
}

pub fn admin_token(user_id: i64) -> String {
    generate_access_token(user_id, ROLE_ADMIN, &test_config().jwt).unwrap()
}

async fn send(
    app: Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

/// Unauthenticated GET.
pub async fn get(app: Router, path: &str) -> Response {
    send(app, Method::GET, path, None, None).await
}

pub async fn get_auth(app: Router, path: &str, token: &str) -> Response {
    send(app, Method::GET, path, Some(token), None).await
}

pub async fn post_auth(app: Router, path: &str, token: &str) -> Response {
    send(app, Method::POST, path, Some(token), None).await
}

pub async fn post_json_auth(
    app: Router,
    path: &str,
    token: &str,
    body: serde_json::Value,
) -> Response {
    send(app, Method::POST, path, Some(token), Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    path: &str,
    token: &str,
    body: serde_json::Value,
) -> Response {
    send(app, Method::PUT, path, Some(token), Some(body)).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

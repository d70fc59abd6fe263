//! End-to-end HTTP tests against PostgreSQL.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use caltrack_db::PgPointsStore;
use common::{admin_token, body_json, build_app_with_store, get, get_auth, post_auth, user_token};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn health_reports_postgres(pool: PgPool) {
    let app = build_app_with_store(Arc::new(PgPointsStore::new(pool.clone())), Some(pool));

    let json = body_json(get(app, "/health").await).await;

    assert_eq!(json["storage"], "postgres");
    assert_eq!(json["db_healthy"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn food_log_persists_points(pool: PgPool) {
    let app = build_app_with_store(Arc::new(PgPointsStore::new(pool.clone())), Some(pool));
    let token = user_token(3);

    let response = post_auth(app.clone(), "/api/v1/activity/food", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["awarded"], true);

    let points = body_json(get_auth(app.clone(), "/api/v1/points", &token).await).await;
    assert_eq!(points["data"]["account"]["lifetime_points"], 510);

    let board = body_json(get_auth(app, "/api/v1/points/leaderboard", &admin_token(1)).await).await;
    assert_eq!(board["data"][0]["user_id"], 3);
}

//! HTTP tests for the rewards shop over the in-memory store.

mod common;

use axum::http::StatusCode;
use axum::Router;
use common::{
    admin_token, body_json, build_test_app, get_auth, post_auth, post_json_auth, put_json_auth,
    user_token,
};
use serde_json::{json, Value};

async fn create_reward(app: &Router, body: Value) -> Value {
    let response = post_json_auth(app.clone(), "/api/v1/rewards", &admin_token(99), body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

async fn grant(app: &Router, user_id: i64, points: i64) {
    let response = post_json_auth(
        app.clone(),
        "/api/v1/points/award",
        &admin_token(99),
        json!({ "user_id": user_id, "points": points, "reason": "manual" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn only_admins_manage_the_catalog() {
    let (app, _store) = build_test_app();

    let response = post_json_auth(
        app,
        "/api/v1/rewards",
        &user_token(1),
        json!({ "name": "Sticker", "points_cost": 50 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invalid_reward_is_rejected() {
    let (app, _store) = build_test_app();

    let response = post_json_auth(
        app,
        "/api/v1/rewards",
        &admin_token(99),
        json!({ "name": "Sticker", "points_cost": 0 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn purchase_spends_points() {
    let (app, _store) = build_test_app();
    let reward = create_reward(
        &app,
        json!({ "name": "Meal plan", "points_cost": 300, "stock_quantity": 5 }),
    )
    .await;
    grant(&app, 1, 500).await;
    let token = user_token(1);

    let path = format!("/api/v1/rewards/{}/purchase", reward["id"]);
    let response = post_auth(app.clone(), &path, &token).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["remaining_points"], 200);
    assert_eq!(json["data"]["purchase"]["points_spent"], 300);

    let purchases = body_json(get_auth(app.clone(), "/api/v1/rewards/purchases", &token).await).await;
    assert_eq!(purchases["data"].as_array().unwrap().len(), 1);

    let catalog = body_json(get_auth(app, "/api/v1/rewards", &token).await).await;
    assert_eq!(catalog["data"][0]["stock_quantity"], 4);
}

#[tokio::test]
async fn purchase_without_funds_returns_422() {
    let (app, _store) = build_test_app();
    let reward = create_reward(&app, json!({ "name": "Blender", "points_cost": 5000 })).await;
    grant(&app, 1, 100).await;
    let token = user_token(1);

    let path = format!("/api/v1/rewards/{}/purchase", reward["id"]);
    let response = post_auth(app.clone(), &path, &token).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["code"], "INSUFFICIENT_POINTS");

    let purchases = body_json(get_auth(app, "/api/v1/rewards/purchases", &token).await).await;
    assert!(purchases["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn level_gated_reward_is_forbidden() {
    let (app, _store) = build_test_app();
    let reward = create_reward(
        &app,
        json!({ "name": "Coaching call", "points_cost": 100, "required_level": 3 }),
    )
    .await;
    grant(&app, 1, 200).await;

    let path = format!("/api/v1/rewards/{}/purchase", reward["id"]);
    let response = post_auth(app, &path, &user_token(1)).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deactivated_reward_is_hidden_from_users() {
    let (app, _store) = build_test_app();
    let reward = create_reward(&app, json!({ "name": "Old mug", "points_cost": 100 })).await;

    let path = format!("/api/v1/rewards/{}", reward["id"]);
    let response = put_json_auth(
        app.clone(),
        &path,
        &admin_token(99),
        json!({ "is_active": false }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["is_active"], false);

    let user_view = body_json(
        get_auth(app.clone(), "/api/v1/rewards?include_inactive=true", &user_token(1)).await,
    )
    .await;
    assert!(user_view["data"].as_array().unwrap().is_empty());

    let admin_view = body_json(
        get_auth(app, "/api/v1/rewards?include_inactive=true", &admin_token(99)).await,
    )
    .await;
    assert_eq!(admin_view["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn stock_limit_can_be_lifted() {
    let (app, _store) = build_test_app();
    let reward = create_reward(
        &app,
        json!({ "name": "Water bottle", "points_cost": 100, "stock_quantity": 2 }),
    )
    .await;
    let path = format!("/api/v1/rewards/{}", reward["id"]);

    let conflicting = put_json_auth(
        app.clone(),
        &path,
        &admin_token(99),
        json!({ "stock_quantity": 4, "clear_stock_quantity": true }),
    )
    .await;
    assert_eq!(conflicting.status(), StatusCode::BAD_REQUEST);

    let response = put_json_auth(
        app,
        &path,
        &admin_token(99),
        json!({ "clear_stock_quantity": true }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"]["stock_quantity"].is_null());
}

#[tokio::test]
async fn updating_missing_reward_returns_404() {
    let (app, _store) = build_test_app();

    let response = put_json_auth(
        app,
        "/api/v1/rewards/777",
        &admin_token(99),
        json!({ "points_cost": 10 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

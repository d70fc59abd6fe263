//! HTTP tests for balances, daily login, admin awards, log events and
//! milestones, over the in-memory store.

mod common;

use axum::http::StatusCode;
use common::{
    admin_token, body_json, build_test_app, get, get_auth, post_auth, post_json_auth, user_token,
};
use serde_json::json;

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn points_require_a_token() {
    let (app, _store) = build_test_app();

    let response = get(app, "/api/v1/points").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn token_without_a_user_id_is_rejected() {
    let (app, _store) = build_test_app();

    let response = get_auth(app, "/api/v1/points", &user_token(0)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_token_is_rejected() {
    let (app, _store) = build_test_app();

    let response = get_auth(app, "/api/v1/points", "not-a-jwt").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Balance and daily login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_user_sees_zero_balance() {
    let (app, _store) = build_test_app();

    let response = get_auth(app, "/api/v1/points", &user_token(1)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["account"]["current_points"], 0);
    assert_eq!(json["data"]["account"]["level"], 1);
    assert_eq!(json["data"]["progress"]["next_threshold"], 1000);
}

#[tokio::test]
async fn daily_login_is_claimed_once() {
    let (app, _store) = build_test_app();
    let token = user_token(1);
    let body = json!({ "local_date": "2026-04-01" });

    let first = post_json_auth(app.clone(), "/api/v1/points/daily-login", &token, body.clone()).await;
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_json(first).await;
    assert_eq!(first["data"]["already_claimed"], false);
    assert_eq!(first["data"]["points_awarded"], 25);

    let second = post_json_auth(app.clone(), "/api/v1/points/daily-login", &token, body).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(body_json(second).await["data"]["already_claimed"], true);

    let points = body_json(get_auth(app, "/api/v1/points", &token).await).await;
    assert_eq!(points["data"]["account"]["current_points"], 25);
    assert_eq!(points["data"]["account"]["last_daily_reward_date"], "2026-04-01");
}

#[tokio::test]
async fn daily_login_without_body_uses_server_date() {
    let (app, _store) = build_test_app();

    let response = post_auth(app, "/api/v1/points/daily-login", &user_token(1)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["points_awarded"], 25);
}

// ---------------------------------------------------------------------------
// Admin awards, history and leaderboard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn award_requires_admin() {
    let (app, _store) = build_test_app();

    let response = post_json_auth(
        app,
        "/api/v1/points/award",
        &user_token(1),
        json!({ "user_id": 1, "points": 1000, "reason": "manual" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_award_reports_level_up() {
    let (app, store) = build_test_app();

    let response = post_json_auth(
        app,
        "/api/v1/points/award",
        &admin_token(99),
        json!({ "user_id": 5, "points": 1010, "reason": "migration_credit" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["level"], 2);
    assert_eq!(json["data"]["current_points"], 1260);
    assert_eq!(json["data"]["level_up"]["bonus_points"], 250);
    assert_eq!(store.transactions_for(5).await.len(), 2);
}

#[tokio::test]
async fn award_with_blank_reason_is_rejected() {
    let (app, _store) = build_test_app();

    let response = post_json_auth(
        app,
        "/api/v1/points/award",
        &admin_token(99),
        json!({ "user_id": 5, "points": 10, "reason": "" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn oversized_award_is_rejected() {
    let (app, store) = build_test_app();

    let response = post_json_auth(
        app,
        "/api/v1/points/award",
        &admin_token(99),
        json!({ "user_id": 5, "points": i64::MAX, "reason": "manual" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    assert!(store.transactions_for(5).await.is_empty());
}

#[tokio::test]
async fn history_is_paginated_newest_first() {
    let (app, _store) = build_test_app();
    let admin = admin_token(99);
    for points in [10, 20, 30] {
        post_json_auth(
            app.clone(),
            "/api/v1/points/award",
            &admin,
            json!({ "user_id": 1, "points": points, "reason": "manual" }),
        )
        .await;
    }

    let json = body_json(
        get_auth(
            app,
            "/api/v1/points/transactions?limit=2&offset=0",
            &user_token(1),
        )
        .await,
    )
    .await;

    let points: Vec<i64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["points"].as_i64().unwrap())
        .collect();
    assert_eq!(points, vec![30, 20]);
}

#[tokio::test]
async fn leaderboard_lists_top_users() {
    let (app, _store) = build_test_app();
    let admin = admin_token(99);
    for (user, points) in [(1, 100), (2, 500)] {
        post_json_auth(
            app.clone(),
            "/api/v1/points/award",
            &admin,
            json!({ "user_id": user, "points": points, "reason": "manual" }),
        )
        .await;
    }

    let json = body_json(get_auth(app, "/api/v1/points/leaderboard", &user_token(1)).await).await;

    let board = json["data"].as_array().unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0]["user_id"], 2);
    assert_eq!(board[0]["rank"], 1);
}

// ---------------------------------------------------------------------------
// Log events and milestones
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_food_log_awards_points_and_achievement() {
    let (app, _store) = build_test_app();
    let token = user_token(1);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/activity/food",
        &token,
        json!({ "reference_id": 314 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["awarded"], true);
    assert_eq!(json["data"]["points_awarded"], 10);
    assert_eq!(
        json["data"]["outcome"]["first_log_achievement"]["status"],
        "awarded"
    );

    let achievements = body_json(get_auth(app.clone(), "/api/v1/achievements", &token).await).await;
    assert_eq!(achievements["data"][0]["achievement_code"], "FIRST_FOOD_LOG");

    let points = body_json(get_auth(app, "/api/v1/points", &token).await).await;
    assert_eq!(points["data"]["account"]["lifetime_points"], 510);
}

#[tokio::test]
async fn unknown_activity_type_is_rejected() {
    let (app, _store) = build_test_app();

    let response = post_auth(app, "/api/v1/activity/water", &user_token(1)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reward_failure_does_not_fail_the_log() {
    let (app, store) = build_test_app();
    store.set_fail_transaction_inserts(true);

    let response = post_auth(app, "/api/v1/activity/weight", &user_token(1)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["awarded"], false);
    assert_eq!(json["data"]["points_awarded"], 0);
    assert!(store.transactions_for(1).await.is_empty());
}

#[tokio::test]
async fn milestones_cover_both_activities() {
    let (app, _store) = build_test_app();
    let token = user_token(1);
    for _ in 0..5 {
        post_auth(app.clone(), "/api/v1/activity/weight", &token).await;
    }

    let json = body_json(get_auth(app, "/api/v1/milestones", &token).await).await;

    let tiers = json["data"].as_array().unwrap();
    assert_eq!(tiers.len(), 2);
    assert_eq!(tiers[0]["activity_type"], "food");
    assert_eq!(tiers[0]["level"], 1);
    assert_eq!(tiers[1]["activity_type"], "weight");
    assert_eq!(tiers[1]["total_logs"], 5);
    assert_eq!(tiers[1]["level"], 2);
}

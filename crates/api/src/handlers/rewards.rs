//! Handlers for the rewards shop.
//!
//! Catalog writes require [`RequireAdmin`]; browsing and purchasing require
//! any authenticated user.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use caltrack_core::rewards::{NewReward, UpdateReward};
use caltrack_core::types::DbId;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::query::IncludeInactiveParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRewardRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub category: Option<String>,
    #[validate(range(min = 1))]
    pub points_cost: i64,
    #[validate(range(min = 1))]
    pub required_level: Option<i32>,
    #[validate(range(min = 0))]
    pub stock_quantity: Option<i32>,
    #[validate(range(min = 1))]
    pub max_per_user: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRewardRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub category: Option<String>,
    #[validate(range(min = 1))]
    pub points_cost: Option<i64>,
    #[validate(range(min = 1))]
    pub required_level: Option<i32>,
    #[validate(range(min = 0))]
    pub stock_quantity: Option<i32>,
    #[validate(range(min = 1))]
    pub max_per_user: Option<i32>,
    /// Make the reward unlimited again.
    #[serde(default)]
    pub clear_stock_quantity: bool,
    #[serde(default)]
    pub clear_max_per_user: bool,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// GET /api/v1/rewards?include_inactive=
///
/// Active rewards, cheapest first. `include_inactive` is honoured for admins only.
pub async fn list_rewards(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<IncludeInactiveParams>,
) -> AppResult<impl IntoResponse> {
    let include_inactive = params.include_inactive && user.is_admin();
    let rewards = state.engine.list_rewards(include_inactive).await?;
    Ok(Json(DataResponse { data: rewards }))
}

/// POST /api/v1/rewards
pub async fn create_reward(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateRewardRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let reward = state
        .engine
        .create_reward(NewReward {
            name: input.name,
            description: input.description,
            category: input.category,
            points_cost: input.points_cost,
            required_level: input.required_level.unwrap_or(1),
            stock_quantity: input.stock_quantity,
            max_per_user: input.max_per_user,
        })
        .await?;

    tracing::info!(admin_id = admin.user_id, reward_id = reward.id, "Reward added to catalog");

    Ok((StatusCode::CREATED, Json(DataResponse { data: reward })))
}

/// PUT /api/v1/rewards/{id}
pub async fn update_reward(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateRewardRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let reward = state
        .engine
        .update_reward(
            id,
            UpdateReward {
                name: input.name,
                description: input.description,
                category: input.category,
                points_cost: input.points_cost,
                required_level: input.required_level,
                stock_quantity: input.stock_quantity,
                max_per_user: input.max_per_user,
                clear_stock_quantity: input.clear_stock_quantity,
                clear_max_per_user: input.clear_max_per_user,
                is_active: input.is_active,
            },
        )
        .await?;
    Ok(Json(DataResponse { data: reward }))
}

// ---------------------------------------------------------------------------
// Purchases
// ---------------------------------------------------------------------------

/// POST /api/v1/rewards/{id}/purchase
///
/// Spend points on a reward. Fails with 422 `INSUFFICIENT_POINTS` when the
/// balance does not cover the cost; no purchase is recorded then.
pub async fn purchase_reward(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let outcome = state.engine.purchase_reward(user.user_id, id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: outcome })))
}

/// GET /api/v1/rewards/purchases
///
/// The caller's purchases, newest first.
pub async fn list_purchases(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let purchases = state.engine.list_purchases(user.user_id).await?;
    Ok(Json(DataResponse { data: purchases }))
}

//! Handlers for balances, the ledger, the leaderboard, daily login and
//! admin awards.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use caltrack_core::pagination::{
    clamp_limit, clamp_offset, HISTORY_DEFAULT_LIMIT, HISTORY_MAX_LIMIT,
    LEADERBOARD_DEFAULT_LIMIT, LEADERBOARD_MAX_LIMIT,
};
use caltrack_core::points::engine::AwardRequest;
use caltrack_core::types::{DbId, LocalDate};
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::query::{LimitParams, PaginationParams};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Body for `POST /points/daily-login`.
///
/// `local_date` is the caller's calendar date; the server's UTC date is used
/// when it is absent.
#[derive(Debug, Default, Deserialize)]
pub struct DailyLoginRequest {
    pub local_date: Option<LocalDate>,
}

/// Body for `POST /points/award`.
#[derive(Debug, Deserialize, Validate)]
pub struct AwardPointsRequest {
    pub user_id: DbId,
    #[validate(range(min = 0, max = 1_000_000))]
    pub points: i64,
    #[validate(length(min = 1, max = 64))]
    pub reason: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub reference_type: Option<String>,
    pub reference_id: Option<DbId>,
    pub metadata: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// GET /api/v1/points
///
/// Balance, level and progress towards the next level for the caller.
pub async fn get_points(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let summary = state.engine.get_user_points(user.user_id).await?;
    Ok(Json(DataResponse { data: summary }))
}

/// GET /api/v1/points/transactions?limit=&offset=
///
/// The caller's ledger, newest first.
pub async fn list_transactions(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, HISTORY_DEFAULT_LIMIT, HISTORY_MAX_LIMIT);
    let offset = clamp_offset(params.offset);
    let transactions = state
        .engine
        .transaction_history(user.user_id, limit, offset)
        .await;
    Ok(Json(DataResponse { data: transactions }))
}

/// GET /api/v1/points/leaderboard?limit=
pub async fn leaderboard(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, LEADERBOARD_DEFAULT_LIMIT, LEADERBOARD_MAX_LIMIT);
    let entries = state.engine.leaderboard(limit).await;
    Ok(Json(DataResponse { data: entries }))
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// POST /api/v1/points/daily-login
///
/// Claim today's login reward. A second claim on the same date returns
/// `already_claimed: true` with status 200.
pub async fn claim_daily_login(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    body: Option<Json<DailyLoginRequest>>,
) -> AppResult<impl IntoResponse> {
    let input = body.map(|Json(b)| b).unwrap_or_default();
    let today = input
        .local_date
        .unwrap_or_else(|| chrono::Utc::now().date_naive());

    let outcome = state.engine.award_daily_login(user.user_id, today).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/v1/points/award
///
/// Credit points to any user. Admin only.
pub async fn award_points(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<AwardPointsRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let mut request = AwardRequest::new(input.user_id, input.points, input.reason);
    if let Some(description) = input.description {
        request = request.with_description(description);
    }
    if let (Some(reference_type), Some(reference_id)) = (input.reference_type, input.reference_id)
    {
        request = request.with_reference(reference_type, reference_id);
    }
    if let Some(metadata) = input.metadata {
        request = request.with_metadata(metadata);
    }

    let outcome = state.engine.award_points(request).await?;

    tracing::info!(
        admin_id = admin.user_id,
        user_id = input.user_id,
        points = input.points,
        "Admin points award",
    );

    Ok(Json(DataResponse { data: outcome }))
}

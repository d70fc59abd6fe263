//! Handler for the caller's milestone tiers.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use caltrack_core::milestones::ActivityType;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/milestones
///
/// Current tier and multiplier for every activity type.
pub async fn get_milestones(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let mut tiers = Vec::with_capacity(ActivityType::ALL.len());
    for activity in ActivityType::ALL {
        tiers.push(state.engine.get_multiplier(user.user_id, activity).await?);
    }
    Ok(Json(DataResponse { data: tiers }))
}

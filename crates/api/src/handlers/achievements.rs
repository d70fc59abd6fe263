use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/achievements
///
/// Achievements earned by the caller, oldest first.
pub async fn list_achievements(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let achievements = state.engine.list_achievements(user.user_id).await?;
    Ok(Json(DataResponse { data: achievements }))
}

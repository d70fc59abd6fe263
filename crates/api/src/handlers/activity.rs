//! Handler invoked by the logging flows after a food or weight entry is saved.
//!
//! The entry itself is owned by the logging service. A failure to reward it
//! is reported in the response body, never as an error status, so the
//! caller's log is not affected.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use caltrack_core::milestones::ActivityType;
use caltrack_core::points::engine::LogEventOutcome;
use caltrack_core::types::DbId;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for `POST /activity/{type}`.
#[derive(Debug, Default, Deserialize)]
pub struct LogActivityRequest {
    /// Id of the saved log entry, recorded as the transaction reference.
    pub reference_id: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct LogActivityResponse {
    pub awarded: bool,
    pub points_awarded: i64,
    pub outcome: Option<LogEventOutcome>,
}

/// POST /api/v1/activity/{activity_type}
///
/// `activity_type` is `food` or `weight`.
pub async fn log_activity(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(activity_type): Path<String>,
    body: Option<Json<LogActivityRequest>>,
) -> AppResult<impl IntoResponse> {
    let activity = ActivityType::from_name(&activity_type)?;
    let input = body.map(|Json(b)| b).unwrap_or_default();

    let response = match state
        .engine
        .reward_log_event(user.user_id, activity, input.reference_id)
        .await
    {
        Ok(outcome) => LogActivityResponse {
            awarded: true,
            points_awarded: outcome.points_awarded,
            outcome: Some(outcome),
        },
        Err(e) => {
            tracing::warn!(
                user_id = user.user_id,
                activity = activity.as_str(),
                error = %e,
                "Failed to reward log entry",
            );
            LogActivityResponse {
                awarded: false,
                points_awarded: 0,
                outcome: None,
            }
        }
    };

    Ok(Json(DataResponse { data: response }))
}

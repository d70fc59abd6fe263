use axum::routing::post;
use axum::Router;

use crate::handlers::activity;
use crate::state::AppState;

/// Routes mounted at `/activity`.
///
/// ```text
/// POST   /{activity_type}   -> log_activity
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{activity_type}", post(activity::log_activity))
}

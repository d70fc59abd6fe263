use axum::routing::get;
use axum::Router;

use crate::handlers::milestones;
use crate::state::AppState;

/// Routes mounted at `/milestones`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(milestones::get_milestones))
}

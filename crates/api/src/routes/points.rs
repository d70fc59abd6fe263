//! Route definitions for balances and the ledger.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::points;
use crate::state::AppState;

/// Routes mounted at `/points`.
///
/// ```text
/// GET    /                -> get_points
/// GET    /transactions    -> list_transactions
/// GET    /leaderboard     -> leaderboard
/// POST   /daily-login     -> claim_daily_login
/// POST   /award           -> award_points (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(points::get_points))
        .route("/transactions", get(points::list_transactions))
        .route("/leaderboard", get(points::leaderboard))
        .route("/daily-login", post(points::claim_daily_login))
        .route("/award", post(points::award_points))
}

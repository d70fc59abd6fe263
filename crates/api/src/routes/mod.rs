pub mod achievements;
pub mod activity;
pub mod health;
pub mod milestones;
pub mod points;
pub mod rewards;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /points                              balance and level progress
/// /points/transactions                 ledger history (paginated)
/// /points/leaderboard                  top users by lifetime points
/// /points/daily-login                  claim daily login reward (POST)
/// /points/award                        award points (POST, admin only)
///
/// /milestones                          milestone tiers per activity
///
/// /activity/{activity_type}            reward a food or weight log (POST)
///
/// /achievements                        earned achievements
///
/// /rewards                             list, create (create is admin only)
/// /rewards/purchases                   caller's purchases
/// /rewards/{id}                        update (PUT, admin only)
/// /rewards/{id}/purchase               purchase (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/points", points::router())
        .nest("/milestones", milestones::router())
        .nest("/activity", activity::router())
        .nest("/achievements", achievements::router())
        .nest("/rewards", rewards::router())
}

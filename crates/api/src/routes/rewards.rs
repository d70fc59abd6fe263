//! Route definitions for the rewards shop.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::rewards;
use crate::state::AppState;

/// Routes mounted at `/rewards`.
///
/// ```text
/// GET    /                -> list_rewards
/// POST   /                -> create_reward (admin)
/// GET    /purchases       -> list_purchases
/// PUT    /{id}            -> update_reward (admin)
/// POST   /{id}/purchase   -> purchase_reward
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(rewards::list_rewards).post(rewards::create_reward))
        .route("/purchases", get(rewards::list_purchases))
        .route("/{id}", put(rewards::update_reward))
        .route("/{id}/purchase", post(rewards::purchase_reward))
}

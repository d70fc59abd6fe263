use std::sync::Arc;

use caltrack_core::points::store::PointsStore;
use caltrack_core::points::PointsEngine;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database pool when running on PostgreSQL, used by the health check.
    pub pool: Option<caltrack_db::DbPool>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The points engine; the only writer of balances.
    pub engine: Arc<PointsEngine>,
}

impl AppState {
    /// Wire an engine over `store` using the configured reward amounts.
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn PointsStore>,
        pool: Option<caltrack_db::DbPool>,
    ) -> Self {
        let engine = PointsEngine::new(store, config.points_config());
        Self {
            pool,
            config: Arc::new(config),
            engine: Arc::new(engine),
        }
    }
}

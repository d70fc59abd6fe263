use caltrack_core::points::{
    PointsConfig, RewardAmounts, DEFAULT_DAILY_LOGIN_POINTS, DEFAULT_FOOD_LOG_POINTS,
    DEFAULT_LEVEL_UP_BONUS, DEFAULT_WEIGHT_LOG_POINTS,
};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on draining in-flight requests at shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// PostgreSQL URL. `None` runs on the in-memory store.
    pub database_url: Option<String>,
    /// JWT token configuration.
    pub jwt: JwtConfig,
    /// Fixed point amounts handed to the engine.
    pub rewards: RewardAmounts,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `0.0.0.0`                  |
    /// | `PORT`                  | `3000`                     |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                       |
    /// | `DATABASE_URL`          | unset (in-memory store)    |
    /// | `POINTS_DAILY_LOGIN`    | `25`                       |
    /// | `POINTS_LEVEL_UP_BONUS` | `250`                      |
    /// | `POINTS_FOOD_LOG`       | `10`                       |
    /// | `POINTS_WEIGHT_LOG`     | `20`                       |
    ///
    /// JWT settings are documented on [`JwtConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let rewards = RewardAmounts {
            daily_login: points_var("POINTS_DAILY_LOGIN", DEFAULT_DAILY_LOGIN_POINTS),
            level_up_bonus: points_var("POINTS_LEVEL_UP_BONUS", DEFAULT_LEVEL_UP_BONUS),
            food_log: points_var("POINTS_FOOD_LOG", DEFAULT_FOOD_LOG_POINTS),
            weight_log: points_var("POINTS_WEIGHT_LOG", DEFAULT_WEIGHT_LOG_POINTS),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            database_url,
            jwt: JwtConfig::from_env(),
            rewards,
        }
    }

    /// Engine configuration: built-in tables with the configured amounts.
    pub fn points_config(&self) -> PointsConfig {
        PointsConfig::with_rewards(self.rewards)
    }
}

/// Read a non-negative point amount, panicking on malformed values.
fn points_var(name: &str, default: i64) -> i64 {
    let value: i64 = match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid i64")),
        Err(_) => default,
    };
    assert!(value >= 0, "{name} must not be negative");
    value
}

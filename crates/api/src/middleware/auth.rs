//! Bearer-token identity for points handlers.
//!
//! This service never issues credentials. Access tokens are minted by the
//! calorie-logging app's account service with the shared `JWT_SECRET`: `sub`
//! is the app's numeric user id (the key of every points account) and `role`
//! is `"user"` or `"admin"`. Handlers only ever act on the caller's own
//! ledger unless the role is admin.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use caltrack_core::error::CoreError;
use caltrack_core::roles::ROLE_ADMIN;
use caltrack_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// The caller whose points account a request reads or mutates.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Owner of the points account (`claims.sub`).
    pub user_id: DbId,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.into()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Expected a Bearer access token"))?;

        let claims = validate_token(token, &state.config.jwt).map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            unauthorized("Invalid or expired token")
        })?;

        // Account ids are positive; anything else cannot own a ledger.
        if claims.sub <= 0 {
            return Err(unauthorized("Token subject is not a user id"));
        }

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

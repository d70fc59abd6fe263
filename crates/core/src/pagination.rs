//! Limit/offset clamping shared by the query surface.

/// Default page size for transaction history.
pub const HISTORY_DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for transaction history.
pub const HISTORY_MAX_LIMIT: i64 = 200;

/// Default number of leaderboard rows.
pub const LEADERBOARD_DEFAULT_LIMIT: i64 = 10;

/// Maximum number of leaderboard rows.
pub const LEADERBOARD_MAX_LIMIT: i64 = 100;

/// Clamp a user-provided limit to `[1, max]`, using `default` when absent.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_limit_uses_default_when_none() {
        assert_eq!(
            clamp_limit(None, HISTORY_DEFAULT_LIMIT, HISTORY_MAX_LIMIT),
            50
        );
    }

    #[test]
    fn clamp_limit_respects_max() {
        assert_eq!(clamp_limit(Some(500), 10, LEADERBOARD_MAX_LIMIT), 100);
    }

    #[test]
    fn clamp_limit_floors_at_one() {
        assert_eq!(clamp_limit(Some(-5), 10, 100), 1);
        assert_eq!(clamp_limit(Some(0), 10, 100), 1);
    }

    #[test]
    fn clamp_offset_floors_at_zero() {
        assert_eq!(clamp_offset(Some(-3)), 0);
        assert_eq!(clamp_offset(None), 0);
        assert_eq!(clamp_offset(Some(40)), 40);
    }
}

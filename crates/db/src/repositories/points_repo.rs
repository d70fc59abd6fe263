//! Repository for the `user_points` and `point_transactions` tables.

use caltrack_core::points::{NewPointTransaction, PointsAccount};
use caltrack_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::points::{LeaderboardRow, PointTransactionRow, PointsAccountRow};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

const ACCOUNT_COLUMNS: &str = "\
    user_id, current_points, lifetime_points, points_spent, level, \
    last_activity_date, last_daily_reward_date, created_at, updated_at";

const TRANSACTION_COLUMNS: &str = "\
    id, user_id, points, transaction_type, reason, description, \
    reference_type, reference_id, metadata, created_at";

/// Accounts and the append-only transaction ledger.
pub struct PointsRepo;

impl PointsRepo {
    // -----------------------------------------------------------------------
    // Accounts
    // -----------------------------------------------------------------------

    pub async fn find(pool: &PgPool, user_id: DbId) -> Result<Option<PointsAccountRow>, sqlx::Error> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM user_points WHERE user_id = $1");
        sqlx::query_as::<_, PointsAccountRow>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Create the account if absent, then lock it with `FOR UPDATE` for the
    /// rest of the transaction.
    pub async fn lock_or_create(
        conn: &mut PgConnection,
        user_id: DbId,
    ) -> Result<PointsAccountRow, sqlx::Error> {
        sqlx::query("INSERT INTO user_points (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        let query =
            format!("SELECT {ACCOUNT_COLUMNS} FROM user_points WHERE user_id = $1 FOR UPDATE");
        sqlx::query_as::<_, PointsAccountRow>(&query)
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await
    }

    /// Write back balances, level and dates of a locked account.
    pub async fn save(conn: &mut PgConnection, account: &PointsAccount) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE user_points SET \
                current_points = $2, lifetime_points = $3, points_spent = $4, level = $5, \
                last_activity_date = $6, last_daily_reward_date = $7, updated_at = NOW() \
             WHERE user_id = $1",
        )
        .bind(account.user_id)
        .bind(account.current_points)
        .bind(account.lifetime_points)
        .bind(account.points_spent)
        .bind(account.level)
        .bind(account.last_activity_date)
        .bind(account.last_daily_reward_date)
        .execute(conn)
        .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Ledger
    // -----------------------------------------------------------------------

    pub async fn insert_transaction(
        conn: &mut PgConnection,
        input: &NewPointTransaction,
    ) -> Result<PointTransactionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO point_transactions \
                (user_id, points, transaction_type, reason, description, \
                 reference_type, reference_id, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {TRANSACTION_COLUMNS}"
        );
        sqlx::query_as::<_, PointTransactionRow>(&query)
            .bind(input.user_id)
            .bind(input.points)
            .bind(input.transaction_type.as_str())
            .bind(&input.reason)
            .bind(&input.description)
            .bind(&input.reference_type)
            .bind(input.reference_id)
            .bind(&input.metadata)
            .fetch_one(conn)
            .await
    }

    /// Newest first.
    pub async fn list_transactions(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PointTransactionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM point_transactions \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, PointTransactionRow>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Top accounts by lifetime points, ties broken by user id.
    pub async fn leaderboard(pool: &PgPool, limit: i64) -> Result<Vec<LeaderboardRow>, sqlx::Error> {
        sqlx::query_as::<_, LeaderboardRow>(
            "SELECT ROW_NUMBER() OVER (ORDER BY lifetime_points DESC, user_id) AS rank, \
                    user_id, lifetime_points, level \
             FROM user_points \
             ORDER BY lifetime_points DESC, user_id \
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}

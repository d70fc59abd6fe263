//! Repository for the `rewards` catalog and `reward_purchases`.

use caltrack_core::rewards::{NewReward, NewRewardPurchase, UpdateReward, PURCHASE_COMPLETED};
use caltrack_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::reward::{RewardPurchaseRow, RewardRow};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

const REWARD_COLUMNS: &str = "\
    id, name, description, category, points_cost, required_level, \
    stock_quantity, max_per_user, is_active, created_at, updated_at";

const PURCHASE_COLUMNS: &str =
    "id, user_id, reward_id, points_spent, transaction_id, status, created_at";

/// Catalog CRUD and purchase bookkeeping.
pub struct RewardRepo;

impl RewardRepo {
    // -----------------------------------------------------------------------
    // Catalog
    // -----------------------------------------------------------------------

    /// Cheapest first.
    pub async fn list(pool: &PgPool, include_inactive: bool) -> Result<Vec<RewardRow>, sqlx::Error> {
        let query = format!(
            "SELECT {REWARD_COLUMNS} FROM rewards \
             WHERE is_active OR $1 \
             ORDER BY points_cost, id"
        );
        sqlx::query_as::<_, RewardRow>(&query)
            .bind(include_inactive)
            .fetch_all(pool)
            .await
    }

    pub async fn create(pool: &PgPool, input: &NewReward) -> Result<RewardRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO rewards \
                (name, description, category, points_cost, required_level, \
                 stock_quantity, max_per_user) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {REWARD_COLUMNS}"
        );
        sqlx::query_as::<_, RewardRow>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.category)
            .bind(input.points_cost)
            .bind(input.required_level)
            .bind(input.stock_quantity)
            .bind(input.max_per_user)
            .fetch_one(pool)
            .await
    }

    /// Patch a reward. Absent fields keep their current value; the clear
    /// flags reset a limit to NULL.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateReward,
    ) -> Result<Option<RewardRow>, sqlx::Error> {
        let query = format!(
            "UPDATE rewards SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                category = COALESCE($4, category), \
                points_cost = COALESCE($5, points_cost), \
                required_level = COALESCE($6, required_level), \
                stock_quantity = CASE WHEN $10 THEN NULL ELSE COALESCE($7, stock_quantity) END, \
                max_per_user = CASE WHEN $11 THEN NULL ELSE COALESCE($8, max_per_user) END, \
                is_active = COALESCE($9, is_active), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {REWARD_COLUMNS}"
        );
        sqlx::query_as::<_, RewardRow>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.category)
            .bind(input.points_cost)
            .bind(input.required_level)
            .bind(input.stock_quantity)
            .bind(input.max_per_user)
            .bind(input.is_active)
            .bind(input.clear_stock_quantity)
            .bind(input.clear_max_per_user)
            .fetch_optional(pool)
            .await
    }

    /// Lock a catalog row for the rest of the transaction.
    pub async fn lock(conn: &mut PgConnection, id: DbId) -> Result<Option<RewardRow>, sqlx::Error> {
        let query = format!("SELECT {REWARD_COLUMNS} FROM rewards WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, RewardRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Take one unit of limited stock. Returns `false` if none was left.
    pub async fn decrement_stock(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE rewards SET stock_quantity = stock_quantity - 1, updated_at = NOW() \
             WHERE id = $1 AND stock_quantity > 0",
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Purchases
    // -----------------------------------------------------------------------

    pub async fn count_purchases(
        conn: &mut PgConnection,
        user_id: DbId,
        reward_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM reward_purchases \
             WHERE user_id = $1 AND reward_id = $2 AND status = $3",
        )
        .bind(user_id)
        .bind(reward_id)
        .bind(PURCHASE_COMPLETED)
        .fetch_one(conn)
        .await
    }

    pub async fn insert_purchase(
        conn: &mut PgConnection,
        input: &NewRewardPurchase,
    ) -> Result<RewardPurchaseRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO reward_purchases \
                (user_id, reward_id, points_spent, transaction_id, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {PURCHASE_COLUMNS}"
        );
        sqlx::query_as::<_, RewardPurchaseRow>(&query)
            .bind(input.user_id)
            .bind(input.reward_id)
            .bind(input.points_spent)
            .bind(input.transaction_id)
            .bind(PURCHASE_COMPLETED)
            .fetch_one(conn)
            .await
    }

    /// Newest first.
    pub async fn list_purchases(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<RewardPurchaseRow>, sqlx::Error> {
        let query = format!(
            "SELECT {PURCHASE_COLUMNS} FROM reward_purchases \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, RewardPurchaseRow>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}

//! `user_points` and `point_transactions` rows.

use caltrack_core::error::CoreError;
use caltrack_core::points::{PointTransaction, PointsAccount, TransactionType};
use caltrack_core::types::{DbId, LocalDate, Timestamp};
use sqlx::FromRow;

/// A row from the `user_points` table.
#[derive(Debug, Clone, FromRow)]
pub struct PointsAccountRow {
    pub user_id: DbId,
    pub current_points: i64,
    pub lifetime_points: i64,
    pub points_spent: i64,
    pub level: i32,
    pub last_activity_date: Option<LocalDate>,
    pub last_daily_reward_date: Option<LocalDate>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<PointsAccountRow> for PointsAccount {
    fn from(row: PointsAccountRow) -> Self {
        Self {
            user_id: row.user_id,
            current_points: row.current_points,
            lifetime_points: row.lifetime_points,
            points_spent: row.points_spent,
            level: row.level,
            last_activity_date: row.last_activity_date,
            last_daily_reward_date: row.last_daily_reward_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A row from the `point_transactions` table.
#[derive(Debug, Clone, FromRow)]
pub struct PointTransactionRow {
    pub id: DbId,
    pub user_id: DbId,
    pub points: i64,
    pub transaction_type: String,
    pub reason: String,
    pub description: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<DbId>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

impl TryFrom<PointTransactionRow> for PointTransaction {
    type Error = CoreError;

    fn try_from(row: PointTransactionRow) -> Result<Self, Self::Error> {
        let transaction_type = TransactionType::from_name(&row.transaction_type).ok_or_else(|| {
            CoreError::Internal(format!(
                "Unknown transaction type '{}' on transaction {}",
                row.transaction_type, row.id
            ))
        })?;
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            points: row.points,
            transaction_type,
            reason: row.reason,
            description: row.description,
            reference_type: row.reference_type,
            reference_id: row.reference_id,
            metadata: row.metadata,
            created_at: row.created_at,
        })
    }
}

/// One ranked leaderboard row.
#[derive(Debug, Clone, FromRow)]
pub struct LeaderboardRow {
    pub rank: i64,
    pub user_id: DbId,
    pub lifetime_points: i64,
    pub level: i32,
}

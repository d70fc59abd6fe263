//! `rewards` and `reward_purchases` rows.

use caltrack_core::rewards::{Reward, RewardPurchase};
use caltrack_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `rewards` catalog.
#[derive(Debug, Clone, FromRow)]
pub struct RewardRow {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub points_cost: i64,
    pub required_level: i32,
    pub stock_quantity: Option<i32>,
    pub max_per_user: Option<i32>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<RewardRow> for Reward {
    fn from(row: RewardRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            category: row.category,
            points_cost: row.points_cost,
            required_level: row.required_level,
            stock_quantity: row.stock_quantity,
            max_per_user: row.max_per_user,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A row from `reward_purchases`.
#[derive(Debug, Clone, FromRow)]
pub struct RewardPurchaseRow {
    pub id: DbId,
    pub user_id: DbId,
    pub reward_id: DbId,
    pub points_spent: i64,
    pub transaction_id: DbId,
    pub status: String,
    pub created_at: Timestamp,
}

impl From<RewardPurchaseRow> for RewardPurchase {
    fn from(row: RewardPurchaseRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            reward_id: row.reward_id,
            points_spent: row.points_spent,
            transaction_id: row.transaction_id,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

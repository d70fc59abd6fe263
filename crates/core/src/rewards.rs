//! Rewards shop records and purchase gating.
//!
//! The shop is the spend side of the ledger. Eligibility is checked here as
//! pure logic; the engine runs it under the reward and account row locks and
//! then spends through the ledger.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Purchase status recorded for fulfilled purchases.
pub const PURCHASE_COMPLETED: &str = "completed";

/// Transaction reason for shop purchases.
pub const REASON_PURCHASE: &str = "reward_purchase";

/// A rewards catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reward {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub points_cost: i64,
    pub required_level: i32,
    /// `None` means unlimited stock.
    pub stock_quantity: Option<i32>,
    pub max_per_user: Option<i32>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for a new catalog entry.
#[derive(Debug, Clone)]
pub struct NewReward {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub points_cost: i64,
    pub required_level: i32,
    pub stock_quantity: Option<i32>,
    pub max_per_user: Option<i32>,
}

/// Patch for a catalog entry; `None` leaves the field untouched.
///
/// `clear_stock_quantity` and `clear_max_per_user` reset the matching limit
/// to unlimited and cannot be combined with a new value for it.
#[derive(Debug, Clone, Default)]
pub struct UpdateReward {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub points_cost: Option<i64>,
    pub required_level: Option<i32>,
    pub stock_quantity: Option<i32>,
    pub max_per_user: Option<i32>,
    pub clear_stock_quantity: bool,
    pub clear_max_per_user: bool,
    pub is_active: Option<bool>,
}

/// A fulfilled purchase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewardPurchase {
    pub id: DbId,
    pub user_id: DbId,
    pub reward_id: DbId,
    pub points_spent: i64,
    pub transaction_id: DbId,
    pub status: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewRewardPurchase {
    pub user_id: DbId,
    pub reward_id: DbId,
    pub points_spent: i64,
    pub transaction_id: DbId,
}

/// Validate catalog input before it reaches storage.
pub fn validate_new_reward(input: &NewReward) -> Result<(), CoreError> {
    if input.name.trim().is_empty() {
        return Err(CoreError::Validation("Reward name must not be empty".into()));
    }
    if input.clear_stock_quantity && input.stock_quantity.is_some() {
        return Err(CoreError::Validation(
            "stock_quantity cannot be both set and cleared".into(),
        ));
    }
    if input.clear_max_per_user && input.max_per_user.is_some() {
        return Err(CoreError::Validation(
            "max_per_user cannot be both set and cleared".into(),
        ));
    }
    validate_numbers(
        Some(input.points_cost),
        Some(input.required_level),
        input.stock_quantity,
        input.max_per_user,
    )
}

/// Validate a catalog patch.
pub fn validate_update_reward(input: &UpdateReward) -> Result<(), CoreError> {
    if matches!(&input.name, Some(name) if name.trim().is_empty()) {
        return Err(CoreError::Validation("Reward name must not be empty".into()));
    }
    validate_numbers(
        input.points_cost,
        input.required_level,
        input.stock_quantity,
        input.max_per_user,
    )
}

fn validate_numbers(
    points_cost: Option<i64>,
    required_level: Option<i32>,
    stock_quantity: Option<i32>,
    max_per_user: Option<i32>,
) -> Result<(), CoreError> {
    if matches!(points_cost, Some(cost) if cost <= 0) {
        return Err(CoreError::Validation("points_cost must be positive".into()));
    }
    if matches!(required_level, Some(level) if level < 1) {
        return Err(CoreError::Validation("required_level must be at least 1".into()));
    }
    if matches!(stock_quantity, Some(stock) if stock < 0) {
        return Err(CoreError::Validation("stock_quantity must not be negative".into()));
    }
    if matches!(max_per_user, Some(max) if max < 1) {
        return Err(CoreError::Validation("max_per_user must be at least 1".into()));
    }
    Ok(())
}

/// Check everything about a purchase except the balance, which is enforced
/// by the spend itself.
///
/// `previous_purchases` is the number of completed purchases of this reward
/// by the user.
pub fn check_purchase_eligibility(
    reward: &Reward,
    user_level: i32,
    previous_purchases: i64,
) -> Result<(), CoreError> {
    if !reward.is_active {
        return Err(CoreError::Validation(format!(
            "Reward '{}' is not available",
            reward.name
        )));
    }
    if user_level < reward.required_level {
        return Err(CoreError::Forbidden(format!(
            "Reward '{}' requires level {} (current level {user_level})",
            reward.name, reward.required_level
        )));
    }
    if reward.stock_quantity == Some(0) {
        return Err(CoreError::Conflict(format!(
            "Reward '{}' is out of stock",
            reward.name
        )));
    }
    if let Some(max) = reward.max_per_user {
        if previous_purchases >= i64::from(max) {
            return Err(CoreError::Conflict(format!(
                "Purchase limit of {max} reached for reward '{}'",
                reward.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;

    fn reward() -> Reward {
        Reward {
            id: 1,
            name: "Water bottle".into(),
            description: None,
            category: Some("merch".into()),
            points_cost: 500,
            required_level: 2,
            stock_quantity: Some(3),
            max_per_user: Some(1),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn eligible_purchase_passes() {
        assert!(check_purchase_eligibility(&reward(), 2, 0).is_ok());
    }

    #[test]
    fn level_gate_is_forbidden() {
        assert_matches!(
            check_purchase_eligibility(&reward(), 1, 0),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn inactive_reward_is_rejected() {
        let mut r = reward();
        r.is_active = false;
        assert_matches!(
            check_purchase_eligibility(&r, 5, 0),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn empty_stock_is_conflict() {
        let mut r = reward();
        r.stock_quantity = Some(0);
        assert_matches!(
            check_purchase_eligibility(&r, 5, 0),
            Err(CoreError::Conflict(msg)) if msg.contains("out of stock")
        );
    }

    #[test]
    fn unlimited_stock_never_runs_out() {
        let mut r = reward();
        r.stock_quantity = None;
        r.max_per_user = None;
        assert!(check_purchase_eligibility(&r, 5, 100).is_ok());
    }

    #[test]
    fn per_user_limit_is_enforced() {
        assert_matches!(
            check_purchase_eligibility(&reward(), 5, 1),
            Err(CoreError::Conflict(msg)) if msg.contains("limit")
        );
    }

    #[test]
    fn new_reward_validation() {
        let mut input = NewReward {
            name: "Sticker".into(),
            description: None,
            category: None,
            points_cost: 100,
            required_level: 1,
            stock_quantity: None,
            max_per_user: None,
        };
        assert!(validate_new_reward(&input).is_ok());
        input.points_cost = 0;
        assert!(validate_new_reward(&input).is_err());
        input.points_cost = 10;
        input.name = "  ".into();
        assert!(validate_new_reward(&input).is_err());
    }

    #[test]
    fn update_validation_ignores_absent_fields() {
        assert!(validate_update_reward(&UpdateReward::default()).is_ok());
        let patch = UpdateReward {
            stock_quantity: Some(-1),
            ..Default::default()
        };
        assert!(validate_update_reward(&patch).is_err());
    }

    #[test]
    fn update_cannot_set_and_clear_a_limit() {
        let patch = UpdateReward {
            stock_quantity: Some(5),
            clear_stock_quantity: true,
            ..Default::default()
        };
        assert_matches!(validate_update_reward(&patch), Err(CoreError::Validation(_)));

        let patch = UpdateReward {
            clear_max_per_user: true,
            ..Default::default()
        };
        assert!(validate_update_reward(&patch).is_ok());
    }
}

//! Storage seam for the points ledger.
//!
//! [`PointsStore`] hands out [`PointsUnit`]s: atomic units of work that see
//! their own writes and make them visible all at once on [`PointsUnit::commit`].
//! Dropping a unit without committing discards everything it did. Rows
//! fetched through the `lock_*` methods stay locked against other units
//! until the unit ends, which is what serializes mutations per user.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::milestones::{ActivityType, MilestoneTier};
use crate::rewards::{NewReward, NewRewardPurchase, Reward, RewardPurchase, UpdateReward};
use crate::types::DbId;

use super::{
    Achievement, LeaderboardEntry, MilestoneRecord, NewAchievement, NewPointTransaction,
    PointTransaction, PointsAccount,
};

/// Durable storage for accounts, the transaction ledger, milestones,
/// achievements and the rewards catalog.
#[async_trait]
pub trait PointsStore: Send + Sync {
    /// Start an atomic unit of work.
    async fn begin(&self) -> Result<Box<dyn PointsUnit>, CoreError>;

    async fn find_account(&self, user_id: DbId) -> Result<Option<PointsAccount>, CoreError>;

    /// Newest first.
    async fn list_transactions(
        &self,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PointTransaction>, CoreError>;

    /// Ranked by lifetime points, ties broken by user id.
    async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, CoreError>;

    async fn list_achievements(&self, user_id: DbId) -> Result<Vec<Achievement>, CoreError>;

    async fn list_rewards(&self, include_inactive: bool) -> Result<Vec<Reward>, CoreError>;

    async fn create_reward(&self, input: &NewReward) -> Result<Reward, CoreError>;

    async fn update_reward(
        &self,
        reward_id: DbId,
        input: &UpdateReward,
    ) -> Result<Option<Reward>, CoreError>;

    /// Newest first.
    async fn list_purchases(&self, user_id: DbId) -> Result<Vec<RewardPurchase>, CoreError>;
}

/// One atomic unit of work against a [`PointsStore`].
#[async_trait]
pub trait PointsUnit: Send {
    /// Lock the user's account row, creating a zero-balance row first if absent.
    async fn lock_account(&mut self, user_id: DbId) -> Result<PointsAccount, CoreError>;

    /// Write back balances, level and dates of a locked account.
    async fn save_account(&mut self, account: &PointsAccount) -> Result<(), CoreError>;

    async fn insert_transaction(
        &mut self,
        input: &NewPointTransaction,
    ) -> Result<PointTransaction, CoreError>;

    /// Lock the milestone record, creating it at zero logs on `base` first if absent.
    async fn lock_milestone(
        &mut self,
        user_id: DbId,
        activity: ActivityType,
        base: MilestoneTier,
    ) -> Result<MilestoneRecord, CoreError>;

    async fn save_milestone(&mut self, record: &MilestoneRecord) -> Result<(), CoreError>;

    /// Insert unless `(user_id, achievement_code)` exists. `None` means the
    /// achievement was already held.
    async fn insert_achievement(
        &mut self,
        input: &NewAchievement,
    ) -> Result<Option<Achievement>, CoreError>;

    async fn lock_reward(&mut self, reward_id: DbId) -> Result<Option<Reward>, CoreError>;

    /// Completed purchases of `reward_id` by `user_id`.
    async fn count_purchases(&mut self, user_id: DbId, reward_id: DbId)
        -> Result<i64, CoreError>;

    /// Take one unit of limited stock from a locked reward.
    async fn decrement_stock(&mut self, reward_id: DbId) -> Result<(), CoreError>;

    async fn insert_purchase(
        &mut self,
        input: &NewRewardPurchase,
    ) -> Result<RewardPurchase, CoreError>;

    /// Make every write of this unit visible. The unit is spent afterwards.
    async fn commit(&mut self) -> Result<(), CoreError>;
}

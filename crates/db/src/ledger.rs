//! Postgres implementation of the points storage seam.
//!
//! A [`PgPointsUnit`] is one database transaction. Locks are row-level
//! `SELECT ... FOR UPDATE`, so concurrent units for different users do not
//! block each other. Every sqlx failure surfaces as
//! [`CoreError::StorageUnavailable`].

use async_trait::async_trait;
use caltrack_core::error::CoreError;
use caltrack_core::milestones::{ActivityType, MilestoneTier};
use caltrack_core::points::store::{PointsStore, PointsUnit};
use caltrack_core::points::{
    Achievement, LeaderboardEntry, MilestoneRecord, NewAchievement, NewPointTransaction,
    PointTransaction, PointsAccount,
};
use caltrack_core::rewards::{NewReward, NewRewardPurchase, Reward, RewardPurchase, UpdateReward};
use caltrack_core::types::DbId;
use sqlx::{PgConnection, Postgres, Transaction};

use crate::repositories::achievement_repo::AchievementRepo;
use crate::repositories::milestone_repo::MilestoneRepo;
use crate::repositories::points_repo::PointsRepo;
use crate::repositories::reward_repo::RewardRepo;
use crate::DbPool;

fn storage_error(err: sqlx::Error) -> CoreError {
    tracing::error!(error = %err, "Points storage error");
    CoreError::StorageUnavailable(err.to_string())
}

/// [`PointsStore`] backed by a Postgres pool.
#[derive(Clone)]
pub struct PgPointsStore {
    pool: DbPool,
}

impl PgPointsStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl PointsStore for PgPointsStore {
    async fn begin(&self) -> Result<Box<dyn PointsUnit>, CoreError> {
        let tx = self.pool.begin().await.map_err(storage_error)?;
        Ok(Box::new(PgPointsUnit { tx: Some(tx) }))
    }

    async fn find_account(&self, user_id: DbId) -> Result<Option<PointsAccount>, CoreError> {
        let row = PointsRepo::find(&self.pool, user_id)
            .await
            .map_err(storage_error)?;
        Ok(row.map(PointsAccount::from))
    }

    async fn list_transactions(
        &self,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PointTransaction>, CoreError> {
        PointsRepo::list_transactions(&self.pool, user_id, limit, offset)
            .await
            .map_err(storage_error)?
            .into_iter()
            .map(PointTransaction::try_from)
            .collect()
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, CoreError> {
        let rows = PointsRepo::leaderboard(&self.pool, limit)
            .await
            .map_err(storage_error)?;
        Ok(rows
            .into_iter()
            .map(|row| LeaderboardEntry {
                rank: row.rank,
                user_id: row.user_id,
                lifetime_points: row.lifetime_points,
                level: row.level,
            })
            .collect())
    }

    async fn list_achievements(&self, user_id: DbId) -> Result<Vec<Achievement>, CoreError> {
        let rows = AchievementRepo::list_for_user(&self.pool, user_id)
            .await
            .map_err(storage_error)?;
        Ok(rows.into_iter().map(Achievement::from).collect())
    }

    async fn list_rewards(&self, include_inactive: bool) -> Result<Vec<Reward>, CoreError> {
        let rows = RewardRepo::list(&self.pool, include_inactive)
            .await
            .map_err(storage_error)?;
        Ok(rows.into_iter().map(Reward::from).collect())
    }

    async fn create_reward(&self, input: &NewReward) -> Result<Reward, CoreError> {
        RewardRepo::create(&self.pool, input)
            .await
            .map(Reward::from)
            .map_err(storage_error)
    }

    async fn update_reward(
        &self,
        reward_id: DbId,
        input: &UpdateReward,
    ) -> Result<Option<Reward>, CoreError> {
        RewardRepo::update(&self.pool, reward_id, input)
            .await
            .map(|row| row.map(Reward::from))
            .map_err(storage_error)
    }

    async fn list_purchases(&self, user_id: DbId) -> Result<Vec<RewardPurchase>, CoreError> {
        let rows = RewardRepo::list_purchases(&self.pool, user_id)
            .await
            .map_err(storage_error)?;
        Ok(rows.into_iter().map(RewardPurchase::from).collect())
    }
}

/// One Postgres transaction. Dropped without commit, it rolls back.
pub struct PgPointsUnit {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgPointsUnit {
    fn conn(&mut self) -> Result<&mut PgConnection, CoreError> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| CoreError::Internal("Unit already committed".into()))
    }
}

#[async_trait]
impl PointsUnit for PgPointsUnit {
    async fn lock_account(&mut self, user_id: DbId) -> Result<PointsAccount, CoreError> {
        let row = PointsRepo::lock_or_create(self.conn()?, user_id)
            .await
            .map_err(storage_error)?;
        Ok(row.into())
    }

    async fn save_account(&mut self, account: &PointsAccount) -> Result<(), CoreError> {
        PointsRepo::save(self.conn()?, account)
            .await
            .map_err(storage_error)
    }

    async fn insert_transaction(
        &mut self,
        input: &NewPointTransaction,
    ) -> Result<PointTransaction, CoreError> {
        let row = PointsRepo::insert_transaction(self.conn()?, input)
            .await
            .map_err(storage_error)?;
        PointTransaction::try_from(row)
    }

    async fn lock_milestone(
        &mut self,
        user_id: DbId,
        activity: ActivityType,
        base: MilestoneTier,
    ) -> Result<MilestoneRecord, CoreError> {
        let row = MilestoneRepo::lock_or_create(self.conn()?, user_id, activity, base)
            .await
            .map_err(storage_error)?;
        Ok(row.into_record(activity))
    }

    async fn save_milestone(&mut self, record: &MilestoneRecord) -> Result<(), CoreError> {
        MilestoneRepo::save(self.conn()?, record)
            .await
            .map_err(storage_error)
    }

    async fn insert_achievement(
        &mut self,
        input: &NewAchievement,
    ) -> Result<Option<Achievement>, CoreError> {
        let row = AchievementRepo::insert_if_absent(self.conn()?, input)
            .await
            .map_err(storage_error)?;
        Ok(row.map(Achievement::from))
    }

    async fn lock_reward(&mut self, reward_id: DbId) -> Result<Option<Reward>, CoreError> {
        let row = RewardRepo::lock(self.conn()?, reward_id)
            .await
            .map_err(storage_error)?;
        Ok(row.map(Reward::from))
    }

    async fn count_purchases(
        &mut self,
        user_id: DbId,
        reward_id: DbId,
    ) -> Result<i64, CoreError> {
        RewardRepo::count_purchases(self.conn()?, user_id, reward_id)
            .await
            .map_err(storage_error)
    }

    async fn decrement_stock(&mut self, reward_id: DbId) -> Result<(), CoreError> {
        let taken = RewardRepo::decrement_stock(self.conn()?, reward_id)
            .await
            .map_err(storage_error)?;
        if taken {
            Ok(())
        } else {
            Err(CoreError::Conflict(format!("Reward {reward_id} is out of stock")))
        }
    }

    async fn insert_purchase(
        &mut self,
        input: &NewRewardPurchase,
    ) -> Result<RewardPurchase, CoreError> {
        let row = RewardRepo::insert_purchase(self.conn()?, input)
            .await
            .map_err(storage_error)?;
        Ok(row.into())
    }

    async fn commit(&mut self) -> Result<(), CoreError> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| CoreError::Internal("Unit already committed".into()))?;
        tx.commit().await.map_err(storage_error)
    }
}

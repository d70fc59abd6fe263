//! In-process [`PointsStore`].
//!
//! A unit takes the store-wide lock for its whole lifetime and works on a
//! staged copy of the state, so units are fully serialized and an
//! uncommitted unit leaves no trace. Used when no database is configured
//! and by tests.
//!
//! Every unit clones the whole ledger, so each operation costs time linear
//! in the number of stored transactions, and nothing survives a restart.
//! It is meant for tests and local development, not production traffic.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::CoreError;
use crate::milestones::{ActivityType, MilestoneTier};
use crate::rewards::{
    NewReward, NewRewardPurchase, Reward, RewardPurchase, UpdateReward, PURCHASE_COMPLETED,
};
use crate::types::DbId;

use super::store::{PointsStore, PointsUnit};
use super::{
    Achievement, LeaderboardEntry, MilestoneRecord, NewAchievement, NewPointTransaction,
    PointTransaction, PointsAccount,
};

#[derive(Debug, Clone, Default)]
struct LedgerState {
    last_id: DbId,
    accounts: HashMap<DbId, PointsAccount>,
    transactions: Vec<PointTransaction>,
    milestones: HashMap<(DbId, ActivityType), MilestoneRecord>,
    achievements: Vec<Achievement>,
    rewards: BTreeMap<DbId, Reward>,
    purchases: Vec<RewardPurchase>,
}

impl LedgerState {
    fn next_id(&mut self) -> DbId {
        self.last_id += 1;
        self.last_id
    }
}

/// Shared, cloneable in-memory ledger.
#[derive(Debug, Clone, Default)]
pub struct MemoryPointsStore {
    state: Arc<Mutex<LedgerState>>,
    fail_transaction_inserts: Arc<AtomicBool>,
}

impl MemoryPointsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent ledger append fail with
    /// [`CoreError::StorageUnavailable`], simulating a storage outage
    /// in the middle of a unit.
    pub fn set_fail_transaction_inserts(&self, fail: bool) {
        self.fail_transaction_inserts.store(fail, Ordering::SeqCst);
    }

    /// All ledger entries of a user, oldest first.
    pub async fn transactions_for(&self, user_id: DbId) -> Vec<PointTransaction> {
        let state = self.state.lock().await;
        state
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn milestone(&self, user_id: DbId, activity: ActivityType) -> Option<MilestoneRecord> {
        let state = self.state.lock().await;
        state.milestones.get(&(user_id, activity)).cloned()
    }
}

#[async_trait]
impl PointsStore for MemoryPointsStore {
    async fn begin(&self) -> Result<Box<dyn PointsUnit>, CoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryUnit {
            guard: Some(guard),
            staged,
            fail_transaction_inserts: Arc::clone(&self.fail_transaction_inserts),
        }))
    }

    async fn find_account(&self, user_id: DbId) -> Result<Option<PointsAccount>, CoreError> {
        Ok(self.state.lock().await.accounts.get(&user_id).cloned())
    }

    async fn list_transactions(
        &self,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PointTransaction>, CoreError> {
        let state = self.state.lock().await;
        Ok(state
            .transactions
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, CoreError> {
        let state = self.state.lock().await;
        let mut accounts: Vec<&PointsAccount> = state.accounts.values().collect();
        accounts.sort_by(|a, b| {
            b.lifetime_points
                .cmp(&a.lifetime_points)
                .then(a.user_id.cmp(&b.user_id))
        });
        Ok(accounts
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .zip(1..)
            .map(|(a, rank)| LeaderboardEntry {
                rank,
                user_id: a.user_id,
                lifetime_points: a.lifetime_points,
                level: a.level,
            })
            .collect())
    }

    async fn list_achievements(&self, user_id: DbId) -> Result<Vec<Achievement>, CoreError> {
        let state = self.state.lock().await;
        Ok(state
            .achievements
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_rewards(&self, include_inactive: bool) -> Result<Vec<Reward>, CoreError> {
        let state = self.state.lock().await;
        let mut rewards: Vec<Reward> = state
            .rewards
            .values()
            .filter(|r| include_inactive || r.is_active)
            .cloned()
            .collect();
        rewards.sort_by(|a, b| a.points_cost.cmp(&b.points_cost).then(a.id.cmp(&b.id)));
        Ok(rewards)
    }

    async fn create_reward(&self, input: &NewReward) -> Result<Reward, CoreError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let reward = Reward {
            id: state.next_id(),
            name: input.name.clone(),
            description: input.description.clone(),
            category: input.category.clone(),
            points_cost: input.points_cost,
            required_level: input.required_level,
            stock_quantity: input.stock_quantity,
            max_per_user: input.max_per_user,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.rewards.insert(reward.id, reward.clone());
        Ok(reward)
    }

    async fn update_reward(
        &self,
        reward_id: DbId,
        input: &UpdateReward,
    ) -> Result<Option<Reward>, CoreError> {
        let mut state = self.state.lock().await;
        let Some(reward) = state.rewards.get_mut(&reward_id) else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            reward.name = name.clone();
        }
        if let Some(description) = &input.description {
            reward.description = Some(description.clone());
        }
        if let Some(category) = &input.category {
            reward.category = Some(category.clone());
        }
        if let Some(cost) = input.points_cost {
            reward.points_cost = cost;
        }
        if let Some(level) = input.required_level {
            reward.required_level = level;
        }
        if input.clear_stock_quantity {
            reward.stock_quantity = None;
        } else if let Some(stock) = input.stock_quantity {
            reward.stock_quantity = Some(stock);
        }
        if input.clear_max_per_user {
            reward.max_per_user = None;
        } else if let Some(max) = input.max_per_user {
            reward.max_per_user = Some(max);
        }
        if let Some(active) = input.is_active {
            reward.is_active = active;
        }
        reward.updated_at = Utc::now();
        Ok(Some(reward.clone()))
    }

    async fn list_purchases(&self, user_id: DbId) -> Result<Vec<RewardPurchase>, CoreError> {
        let state = self.state.lock().await;
        Ok(state
            .purchases
            .iter()
            .rev()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }
}

struct MemoryUnit {
    guard: Option<OwnedMutexGuard<LedgerState>>,
    staged: LedgerState,
    fail_transaction_inserts: Arc<AtomicBool>,
}

impl MemoryUnit {
    fn state(&mut self) -> Result<&mut LedgerState, CoreError> {
        if self.guard.is_none() {
            return Err(CoreError::Internal("Unit already committed".into()));
        }
        Ok(&mut self.staged)
    }
}

#[async_trait]
impl PointsUnit for MemoryUnit {
    async fn lock_account(&mut self, user_id: DbId) -> Result<PointsAccount, CoreError> {
        let state = self.state()?;
        let account = state
            .accounts
            .entry(user_id)
            .or_insert_with(|| PointsAccount::empty(user_id, Utc::now()));
        Ok(account.clone())
    }

    async fn save_account(&mut self, account: &PointsAccount) -> Result<(), CoreError> {
        let state = self.state()?;
        state.accounts.insert(account.user_id, account.clone());
        Ok(())
    }

    async fn insert_transaction(
        &mut self,
        input: &NewPointTransaction,
    ) -> Result<PointTransaction, CoreError> {
        if self.fail_transaction_inserts.load(Ordering::SeqCst) {
            return Err(CoreError::StorageUnavailable(
                "ledger append rejected".into(),
            ));
        }
        let state = self.state()?;
        let transaction = PointTransaction {
            id: state.next_id(),
            user_id: input.user_id,
            points: input.points,
            transaction_type: input.transaction_type,
            reason: input.reason.clone(),
            description: input.description.clone(),
            reference_type: input.reference_type.clone(),
            reference_id: input.reference_id,
            metadata: input.metadata.clone(),
            created_at: Utc::now(),
        };
        state.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn lock_milestone(
        &mut self,
        user_id: DbId,
        activity: ActivityType,
        base: MilestoneTier,
    ) -> Result<MilestoneRecord, CoreError> {
        let state = self.state()?;
        let record = state
            .milestones
            .entry((user_id, activity))
            .or_insert_with(|| MilestoneRecord {
                user_id,
                activity_type: activity,
                total_logs: 0,
                milestone_level: base.level,
                points_multiplier: base.multiplier,
                updated_at: Utc::now(),
            });
        Ok(record.clone())
    }

    async fn save_milestone(&mut self, record: &MilestoneRecord) -> Result<(), CoreError> {
        let state = self.state()?;
        state
            .milestones
            .insert((record.user_id, record.activity_type), record.clone());
        Ok(())
    }

    async fn insert_achievement(
        &mut self,
        input: &NewAchievement,
    ) -> Result<Option<Achievement>, CoreError> {
        let state = self.state()?;
        let held = state
            .achievements
            .iter()
            .any(|a| a.user_id == input.user_id && a.achievement_code == input.achievement_code);
        if held {
            return Ok(None);
        }
        let achievement = Achievement {
            id: state.next_id(),
            user_id: input.user_id,
            achievement_code: input.achievement_code.clone(),
            name: input.name.clone(),
            description: input.description.clone(),
            icon: input.icon.clone(),
            points_awarded: input.points_awarded,
            earned_at: Utc::now(),
        };
        state.achievements.push(achievement.clone());
        Ok(Some(achievement))
    }

    async fn lock_reward(&mut self, reward_id: DbId) -> Result<Option<Reward>, CoreError> {
        Ok(self.state()?.rewards.get(&reward_id).cloned())
    }

    async fn count_purchases(
        &mut self,
        user_id: DbId,
        reward_id: DbId,
    ) -> Result<i64, CoreError> {
        let count = self
            .state()?
            .purchases
            .iter()
            .filter(|p| {
                p.user_id == user_id && p.reward_id == reward_id && p.status == PURCHASE_COMPLETED
            })
            .count();
        Ok(count as i64)
    }

    async fn decrement_stock(&mut self, reward_id: DbId) -> Result<(), CoreError> {
        let reward = self
            .state()?
            .rewards
            .get_mut(&reward_id)
            .ok_or(CoreError::NotFound {
                entity: "reward",
                id: reward_id,
            })?;
        match reward.stock_quantity {
            Some(0) => Err(CoreError::Conflict(format!(
                "Reward '{}' is out of stock",
                reward.name
            ))),
            Some(n) => {
                reward.stock_quantity = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn insert_purchase(
        &mut self,
        input: &NewRewardPurchase,
    ) -> Result<RewardPurchase, CoreError> {
        let state = self.state()?;
        let purchase = RewardPurchase {
            id: state.next_id(),
            user_id: input.user_id,
            reward_id: input.reward_id,
            points_spent: input.points_spent,
            transaction_id: input.transaction_id,
            status: PURCHASE_COMPLETED.to_string(),
            created_at: Utc::now(),
        };
        state.purchases.push(purchase.clone());
        Ok(purchase)
    }

    async fn commit(&mut self) -> Result<(), CoreError> {
        let mut guard = self
            .guard
            .take()
            .ok_or_else(|| CoreError::Internal("Unit already committed".into()))?;
        *guard = std::mem::take(&mut self.staged);
        Ok(())
    }
}

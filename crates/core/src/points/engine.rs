//! The points engine.
//!
//! Every balance mutation goes through [`PointsEngine`]. Each public
//! mutating operation is exactly one [`PointsUnit`]: nested effects such as
//! level-up bonuses, milestone bonuses and achievement credits run inside
//! the unit of the operation that triggered them, so they commit or vanish
//! together.
//!
//! Inside a unit, rows are locked in a fixed order (reward, milestone,
//! achievement, account) and the account row is always taken last.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::achievements::{first_log_achievement, validate_achievement_code};
use crate::error::CoreError;
use crate::levels::LevelProgress;
use crate::milestones::{apply_multiplier, ActivityType};
use crate::rewards::{
    check_purchase_eligibility, validate_new_reward, validate_update_reward, NewReward,
    NewRewardPurchase, Reward, RewardPurchase, UpdateReward, REASON_PURCHASE,
};
use crate::types::{DbId, LocalDate};

use super::store::{PointsStore, PointsUnit};
use super::{
    Achievement, LeaderboardEntry, MilestoneRecord, NewAchievement, NewPointTransaction,
    PointTransaction, PointsAccount, PointsConfig, TransactionType, REASON_ACHIEVEMENT,
    REASON_DAILY_LOGIN, REASON_LEVEL_UP, REFERENCE_ACHIEVEMENT, REFERENCE_REWARD,
};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A request to credit points.
///
/// Built with [`AwardRequest::new`] and the `with_*` methods.
#[derive(Debug, Clone, PartialEq)]
pub struct AwardRequest {
    pub user_id: DbId,
    pub points: i64,
    pub reason: String,
    pub description: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<DbId>,
    pub metadata: Option<serde_json::Value>,
}

impl AwardRequest {
    pub fn new(user_id: DbId, points: i64, reason: impl Into<String>) -> Self {
        Self {
            user_id,
            points,
            reason: reason.into(),
            description: None,
            reference_type: None,
            reference_id: None,
            metadata: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Link the credit to the domain event that caused it.
    pub fn with_reference(mut self, reference_type: impl Into<String>, reference_id: DbId) -> Self {
        self.reference_type = Some(reference_type.into());
        self.reference_id = Some(reference_id);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A request to debit points.
#[derive(Debug, Clone, PartialEq)]
pub struct SpendRequest {
    pub user_id: DbId,
    pub points: i64,
    pub reason: String,
    pub description: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<DbId>,
}

impl SpendRequest {
    pub fn new(user_id: DbId, points: i64, reason: impl Into<String>) -> Self {
        Self {
            user_id,
            points,
            reason: reason.into(),
            description: None,
            reference_type: None,
            reference_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_reference(mut self, reference_type: impl Into<String>, reference_id: DbId) -> Self {
        self.reference_type = Some(reference_type.into());
        self.reference_id = Some(reference_id);
        self
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelUp {
    pub previous_level: i32,
    pub new_level: i32,
    pub bonus_points: i64,
    pub transaction_id: DbId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AwardOutcome {
    pub transaction_id: DbId,
    pub points_awarded: i64,
    pub current_points: i64,
    pub lifetime_points: i64,
    pub level: i32,
    pub level_up: Option<LevelUp>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendOutcome {
    pub transaction_id: DbId,
    pub points_spent: i64,
    pub remaining_points: i64,
}

/// Result of a daily login claim. `already_claimed` is a normal outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyLoginOutcome {
    pub already_claimed: bool,
    pub points_awarded: Option<i64>,
    pub level_up: Option<LevelUp>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityOutcome {
    pub activity_type: ActivityType,
    pub new_total_logs: i64,
    pub milestone_level: i32,
    pub multiplier: f64,
    pub leveled_up: bool,
    pub bonus: Option<AwardOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiplierInfo {
    pub activity_type: ActivityType,
    pub total_logs: i64,
    pub level: i32,
    pub multiplier: f64,
}

impl From<&MilestoneRecord> for MultiplierInfo {
    fn from(record: &MilestoneRecord) -> Self {
        Self {
            activity_type: record.activity_type,
            total_logs: record.total_logs,
            level: record.milestone_level,
            multiplier: record.points_multiplier,
        }
    }
}

/// Result of an achievement grant. A repeat grant is not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AchievementOutcome {
    AlreadyAwarded,
    Awarded {
        achievement: Achievement,
        award: Option<AwardOutcome>,
    },
}

impl AchievementOutcome {
    pub fn already_awarded(&self) -> bool {
        matches!(self, Self::AlreadyAwarded)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEventOutcome {
    pub activity: ActivityOutcome,
    pub base_points: i64,
    pub multiplier: f64,
    pub points_awarded: i64,
    pub award: AwardOutcome,
    pub first_log_achievement: Option<AchievementOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseOutcome {
    pub purchase: RewardPurchase,
    pub remaining_points: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointsSummary {
    pub account: PointsAccount,
    pub progress: LevelProgress,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Applies point deltas, level-ups, milestones, achievements and purchases
/// against a [`PointsStore`].
pub struct PointsEngine {
    store: Arc<dyn PointsStore>,
    config: PointsConfig,
}

impl PointsEngine {
    pub fn new(store: Arc<dyn PointsStore>, config: PointsConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &PointsConfig {
        &self.config
    }

    // -- earn / spend --------------------------------------------------------

    /// Credit points, evaluating a level-up in the same unit.
    pub async fn award_points(&self, request: AwardRequest) -> Result<AwardOutcome, CoreError> {
        let mut unit = self.store.begin().await?;
        let outcome = self.award_in(unit.as_mut(), request).await?;
        unit.commit().await?;
        Ok(outcome)
    }

    /// Debit points. Fails with [`CoreError::InsufficientPoints`] before any
    /// write when the balance does not cover the amount.
    pub async fn spend_points(&self, request: SpendRequest) -> Result<SpendOutcome, CoreError> {
        let mut unit = self.store.begin().await?;
        let outcome = self.spend_in(unit.as_mut(), request).await?;
        unit.commit().await?;
        Ok(outcome)
    }

    /// Grant the once-per-day login reward for `today` (the caller's local date).
    pub async fn award_daily_login(
        &self,
        user_id: DbId,
        today: LocalDate,
    ) -> Result<DailyLoginOutcome, CoreError> {
        let mut unit = self.store.begin().await?;

        let mut account = unit.lock_account(user_id).await?;
        if account.last_daily_reward_date == Some(today) {
            tracing::debug!(user_id, %today, "Daily login reward already claimed");
            return Ok(DailyLoginOutcome {
                already_claimed: true,
                points_awarded: None,
                level_up: None,
            });
        }

        account.last_activity_date = Some(today);
        account.last_daily_reward_date = Some(today);
        account.updated_at = Utc::now();
        unit.save_account(&account).await?;

        let request = AwardRequest::new(user_id, self.config.rewards.daily_login, REASON_DAILY_LOGIN)
            .with_description("Daily login reward")
            .with_metadata(json!({ "date": today.to_string() }));
        let award = self.award_in(unit.as_mut(), request).await?;
        unit.commit().await?;

        Ok(DailyLoginOutcome {
            already_claimed: false,
            points_awarded: Some(award.points_awarded),
            level_up: award.level_up,
        })
    }

    // -- milestones ----------------------------------------------------------

    /// Count one qualifying activity and apply a milestone level-up bonus if
    /// the new count crosses a tier.
    pub async fn record_activity(
        &self,
        user_id: DbId,
        activity: ActivityType,
    ) -> Result<ActivityOutcome, CoreError> {
        let mut unit = self.store.begin().await?;
        let (record, leveled_up) = self.bump_milestone(unit.as_mut(), user_id, activity).await?;
        let bonus = if leveled_up {
            Some(self.milestone_bonus(unit.as_mut(), &record).await?)
        } else {
            None
        };
        unit.commit().await?;

        Ok(activity_outcome(&record, leveled_up, bonus))
    }

    /// Current milestone tier for an activity, creating the record at the
    /// base tier if the user has none yet.
    pub async fn get_multiplier(
        &self,
        user_id: DbId,
        activity: ActivityType,
    ) -> Result<MultiplierInfo, CoreError> {
        let base = self.config.milestones_for(activity).base_tier();
        let mut unit = self.store.begin().await?;
        let record = unit.lock_milestone(user_id, activity, base).await?;
        unit.commit().await?;
        Ok(MultiplierInfo::from(&record))
    }

    // -- achievements --------------------------------------------------------

    /// Grant an achievement once per user and code, crediting its points on
    /// the first grant only.
    pub async fn award_achievement(
        &self,
        input: NewAchievement,
    ) -> Result<AchievementOutcome, CoreError> {
        validate_achievement_code(&input.achievement_code)?;
        if input.points_awarded < 0 {
            return Err(CoreError::Validation(
                "Achievement points must not be negative".into(),
            ));
        }

        let mut unit = self.store.begin().await?;
        let Some(achievement) = unit.insert_achievement(&input).await? else {
            tracing::debug!(
                user_id = input.user_id,
                code = %input.achievement_code,
                "Achievement already awarded",
            );
            return Ok(AchievementOutcome::AlreadyAwarded);
        };
        let award = self.credit_achievement(unit.as_mut(), &achievement).await?;
        unit.commit().await?;

        tracing::info!(
            user_id = achievement.user_id,
            code = %achievement.achievement_code,
            points = achievement.points_awarded,
            "Achievement awarded",
        );
        Ok(AchievementOutcome::Awarded { achievement, award })
    }

    pub async fn list_achievements(&self, user_id: DbId) -> Result<Vec<Achievement>, CoreError> {
        self.store.list_achievements(user_id).await
    }

    // -- log events ----------------------------------------------------------

    /// Reward one food or weight log: count it towards milestones, credit
    /// `round(base * multiplier)` points, and grant the first-log achievement
    /// on the first log of its type.
    pub async fn reward_log_event(
        &self,
        user_id: DbId,
        activity: ActivityType,
        reference_id: Option<DbId>,
    ) -> Result<LogEventOutcome, CoreError> {
        let mut unit = self.store.begin().await?;

        let (record, leveled_up) = self.bump_milestone(unit.as_mut(), user_id, activity).await?;

        let first_log = if record.total_logs == 1 {
            let def = first_log_achievement(activity);
            let input = NewAchievement {
                user_id,
                achievement_code: def.code.to_string(),
                name: def.name.to_string(),
                description: Some(def.description.to_string()),
                icon: Some(def.icon.to_string()),
                points_awarded: def.points,
            };
            unit.insert_achievement(&input).await?
        } else {
            None
        };

        let bonus = if leveled_up {
            Some(self.milestone_bonus(unit.as_mut(), &record).await?)
        } else {
            None
        };

        let base_points = self.config.rewards.base_for(activity);
        let multiplier = record.points_multiplier;
        let points = apply_multiplier(base_points, multiplier);
        let mut request = AwardRequest::new(user_id, points, activity.log_reason())
            .with_description(format!("Logged {} entry", activity.as_str()))
            .with_metadata(json!({
                "base_points": base_points,
                "multiplier": multiplier,
                "total_logs": record.total_logs,
            }));
        if let Some(reference_id) = reference_id {
            request = request.with_reference(activity.log_reason(), reference_id);
        }
        let award = self.award_in(unit.as_mut(), request).await?;

        let first_log_achievement = match first_log {
            Some(achievement) => {
                let award = self.credit_achievement(unit.as_mut(), &achievement).await?;
                Some(AchievementOutcome::Awarded { achievement, award })
            }
            None => None,
        };

        unit.commit().await?;

        Ok(LogEventOutcome {
            activity: activity_outcome(&record, leveled_up, bonus),
            base_points,
            multiplier,
            points_awarded: points,
            award,
            first_log_achievement,
        })
    }

    // -- rewards shop --------------------------------------------------------

    /// Buy a catalog reward with points. Nothing is written when any gate
    /// (availability, level, stock, per-user limit, balance) fails.
    pub async fn purchase_reward(
        &self,
        user_id: DbId,
        reward_id: DbId,
    ) -> Result<PurchaseOutcome, CoreError> {
        let mut unit = self.store.begin().await?;

        let reward = unit
            .lock_reward(reward_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "reward",
                id: reward_id,
            })?;
        let account = unit.lock_account(user_id).await?;
        let previous_purchases = if reward.max_per_user.is_some() {
            unit.count_purchases(user_id, reward_id).await?
        } else {
            0
        };
        check_purchase_eligibility(&reward, account.level, previous_purchases)?;

        let request = SpendRequest::new(user_id, reward.points_cost, REASON_PURCHASE)
            .with_description(format!("Purchased {}", reward.name))
            .with_reference(REFERENCE_REWARD, reward.id);
        let spend = self.spend_in(unit.as_mut(), request).await?;

        if reward.stock_quantity.is_some() {
            unit.decrement_stock(reward_id).await?;
        }
        let purchase = unit
            .insert_purchase(&NewRewardPurchase {
                user_id,
                reward_id,
                points_spent: spend.points_spent,
                transaction_id: spend.transaction_id,
            })
            .await?;
        unit.commit().await?;

        tracing::info!(
            user_id,
            reward_id,
            points = spend.points_spent,
            remaining = spend.remaining_points,
            "Reward purchased",
        );
        Ok(PurchaseOutcome {
            purchase,
            remaining_points: spend.remaining_points,
        })
    }

    pub async fn list_rewards(&self, include_inactive: bool) -> Result<Vec<Reward>, CoreError> {
        self.store.list_rewards(include_inactive).await
    }

    pub async fn create_reward(&self, input: NewReward) -> Result<Reward, CoreError> {
        validate_new_reward(&input)?;
        let reward = self.store.create_reward(&input).await?;
        tracing::info!(reward_id = reward.id, name = %reward.name, "Reward created");
        Ok(reward)
    }

    pub async fn update_reward(
        &self,
        reward_id: DbId,
        input: UpdateReward,
    ) -> Result<Reward, CoreError> {
        validate_update_reward(&input)?;
        self.store
            .update_reward(reward_id, &input)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "reward",
                id: reward_id,
            })
    }

    pub async fn list_purchases(&self, user_id: DbId) -> Result<Vec<RewardPurchase>, CoreError> {
        self.store.list_purchases(user_id).await
    }

    // -- queries -------------------------------------------------------------

    /// Balance summary and level progress. Users without an account yet get
    /// an all-zero summary; nothing is written.
    pub async fn get_user_points(&self, user_id: DbId) -> Result<PointsSummary, CoreError> {
        let account = self
            .store
            .find_account(user_id)
            .await?
            .unwrap_or_else(|| PointsAccount::empty(user_id, Utc::now()));
        let progress = self.config.levels.progress(account.lifetime_points);
        Ok(PointsSummary { account, progress })
    }

    /// Newest-first ledger page. Storage failures yield an empty page.
    pub async fn transaction_history(
        &self,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Vec<PointTransaction> {
        match self.store.list_transactions(user_id, limit, offset).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to load transaction history");
                Vec::new()
            }
        }
    }

    /// Top users by lifetime points. Storage failures yield an empty board.
    pub async fn leaderboard(&self, limit: i64) -> Vec<LeaderboardEntry> {
        match self.store.leaderboard(limit).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load leaderboard");
                Vec::new()
            }
        }
    }

    // -- unit-scoped steps ---------------------------------------------------

    async fn award_in(
        &self,
        unit: &mut dyn PointsUnit,
        request: AwardRequest,
    ) -> Result<AwardOutcome, CoreError> {
        if request.points < 0 {
            return Err(CoreError::Validation(format!(
                "Cannot award a negative amount of points ({})",
                request.points
            )));
        }

        let mut account = unit.lock_account(request.user_id).await?;
        credit(&mut account, request.points)?;

        let transaction = unit
            .insert_transaction(&NewPointTransaction {
                user_id: request.user_id,
                points: request.points,
                transaction_type: TransactionType::Earn,
                reason: request.reason.clone(),
                description: request.description,
                reference_type: request.reference_type,
                reference_id: request.reference_id,
                metadata: request.metadata,
            })
            .await?;

        // The bonus itself is not re-evaluated; a later award catches up.
        let new_level = self.config.levels.calculate_level(account.lifetime_points);
        let level_up = if new_level > account.level {
            let previous_level = account.level;
            let bonus_points = self.config.rewards.level_up_bonus;
            account.level = new_level;
            credit(&mut account, bonus_points)?;

            let bonus = unit
                .insert_transaction(&NewPointTransaction {
                    user_id: request.user_id,
                    points: bonus_points,
                    transaction_type: TransactionType::Earn,
                    reason: REASON_LEVEL_UP.to_string(),
                    description: Some(format!("Reached level {new_level}")),
                    reference_type: None,
                    reference_id: None,
                    metadata: Some(json!({
                        "previous_level": previous_level,
                        "new_level": new_level,
                    })),
                })
                .await?;

            tracing::info!(
                user_id = request.user_id,
                previous_level,
                new_level,
                bonus = bonus_points,
                "User leveled up",
            );
            Some(LevelUp {
                previous_level,
                new_level,
                bonus_points,
                transaction_id: bonus.id,
            })
        } else {
            None
        };

        account.updated_at = Utc::now();
        unit.save_account(&account).await?;

        tracing::info!(
            user_id = request.user_id,
            points = request.points,
            reason = %request.reason,
            balance = account.current_points,
            "Points awarded",
        );
        Ok(AwardOutcome {
            transaction_id: transaction.id,
            points_awarded: request.points,
            current_points: account.current_points,
            lifetime_points: account.lifetime_points,
            level: account.level,
            level_up,
        })
    }

    async fn spend_in(
        &self,
        unit: &mut dyn PointsUnit,
        request: SpendRequest,
    ) -> Result<SpendOutcome, CoreError> {
        if request.points <= 0 {
            return Err(CoreError::Validation(format!(
                "Spend amount must be positive ({})",
                request.points
            )));
        }

        let mut account = unit.lock_account(request.user_id).await?;
        if account.current_points < request.points {
            return Err(CoreError::InsufficientPoints {
                required: request.points,
                available: account.current_points,
            });
        }

        account.points_spent = account
            .points_spent
            .checked_add(request.points)
            .ok_or_else(|| overflow(request.user_id))?;
        account.current_points -= request.points;

        let transaction = unit
            .insert_transaction(&NewPointTransaction {
                user_id: request.user_id,
                points: -request.points,
                transaction_type: TransactionType::Spend,
                reason: request.reason.clone(),
                description: request.description,
                reference_type: request.reference_type,
                reference_id: request.reference_id,
                metadata: None,
            })
            .await?;

        account.updated_at = Utc::now();
        unit.save_account(&account).await?;

        tracing::info!(
            user_id = request.user_id,
            points = request.points,
            reason = %request.reason,
            balance = account.current_points,
            "Points spent",
        );
        Ok(SpendOutcome {
            transaction_id: transaction.id,
            points_spent: request.points,
            remaining_points: account.current_points,
        })
    }

    /// Increment the log counter and move to a higher tier if reached.
    /// Returns the saved record and whether the tier changed.
    async fn bump_milestone(
        &self,
        unit: &mut dyn PointsUnit,
        user_id: DbId,
        activity: ActivityType,
    ) -> Result<(MilestoneRecord, bool), CoreError> {
        let table = self.config.milestones_for(activity);
        let mut record = unit
            .lock_milestone(user_id, activity, table.base_tier())
            .await?;

        record.total_logs += 1;
        let tier = table.tier_for(record.total_logs);
        let leveled_up = tier.level > record.milestone_level;
        if leveled_up {
            record.milestone_level = tier.level;
            record.points_multiplier = tier.multiplier;
        }
        record.updated_at = Utc::now();
        unit.save_milestone(&record).await?;

        if leveled_up {
            tracing::info!(
                user_id,
                activity = activity.as_str(),
                total_logs = record.total_logs,
                level = record.milestone_level,
                multiplier = record.points_multiplier,
                "Milestone level reached",
            );
        }
        Ok((record, leveled_up))
    }

    async fn milestone_bonus(
        &self,
        unit: &mut dyn PointsUnit,
        record: &MilestoneRecord,
    ) -> Result<AwardOutcome, CoreError> {
        let activity = record.activity_type;
        let request = AwardRequest::new(
            record.user_id,
            self.config.rewards.level_up_bonus,
            activity.milestone_reason(),
        )
        .with_description(format!(
            "Reached {} milestone level {}",
            activity.as_str(),
            record.milestone_level
        ))
        .with_metadata(json!({
            "milestone_level": record.milestone_level,
            "total_logs": record.total_logs,
            "multiplier": record.points_multiplier,
        }));
        self.award_in(unit, request).await
    }

    async fn credit_achievement(
        &self,
        unit: &mut dyn PointsUnit,
        achievement: &Achievement,
    ) -> Result<Option<AwardOutcome>, CoreError> {
        if achievement.points_awarded <= 0 {
            return Ok(None);
        }
        let request = AwardRequest::new(
            achievement.user_id,
            achievement.points_awarded,
            REASON_ACHIEVEMENT,
        )
        .with_description(format!("Achievement unlocked: {}", achievement.name))
        .with_reference(REFERENCE_ACHIEVEMENT, achievement.id)
        .with_metadata(json!({ "achievement_code": achievement.achievement_code }));
        Ok(Some(self.award_in(unit, request).await?))
    }
}

fn activity_outcome(
    record: &MilestoneRecord,
    leveled_up: bool,
    bonus: Option<AwardOutcome>,
) -> ActivityOutcome {
    ActivityOutcome {
        activity_type: record.activity_type,
        new_total_logs: record.total_logs,
        milestone_level: record.milestone_level,
        multiplier: record.points_multiplier,
        leveled_up,
        bonus,
    }
}

/// Add `points` to both the spendable and lifetime balances, refusing
/// amounts that would overflow either.
fn credit(account: &mut PointsAccount, points: i64) -> Result<(), CoreError> {
    let current = account.current_points.checked_add(points);
    let lifetime = account.lifetime_points.checked_add(points);
    match (current, lifetime) {
        (Some(current), Some(lifetime)) => {
            account.current_points = current;
            account.lifetime_points = lifetime;
            Ok(())
        }
        _ => Err(overflow(account.user_id)),
    }
}

fn overflow(user_id: DbId) -> CoreError {
    CoreError::Validation(format!(
        "Points amount would overflow the balance of user {user_id}"
    ))
}

//! Points ledger: records, configuration, the storage seam, and the engine.
//!
//! - [`store`] -- the atomic unit-of-work capability storage must provide.
//! - [`engine`] -- [`PointsEngine`], the only writer of balances.
//! - [`memory`] -- an in-process [`store::PointsStore`] implementation.

pub mod engine;
pub mod memory;
pub mod store;

use serde::Serialize;

use crate::levels::LevelTable;
use crate::milestones::{ActivityType, MilestoneTable};
use crate::types::{DbId, LocalDate, Timestamp};

pub use engine::PointsEngine;

// ---------------------------------------------------------------------------
// Transaction reasons
// ---------------------------------------------------------------------------

pub const REASON_DAILY_LOGIN: &str = "daily_login";
pub const REASON_LEVEL_UP: &str = "level_up";
pub const REASON_ACHIEVEMENT: &str = "achievement";

/// Reference type attached to achievement credits.
pub const REFERENCE_ACHIEVEMENT: &str = "achievement";

/// Reference type attached to purchase debits.
pub const REFERENCE_REWARD: &str = "reward";

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Earn,
    Spend,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Earn => "earn",
            Self::Spend => "spend",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "earn" => Some(Self::Earn),
            "spend" => Some(Self::Spend),
            _ => None,
        }
    }
}

/// Per-user balance summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointsAccount {
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

impl PointsAccount {
    /// A fresh zero-balance account.
    pub fn empty(user_id: DbId, now: Timestamp) -> Self {
        Self {
            user_id,
            current_points: 0,
            lifetime_points: 0,
            points_spent: 0,
            level: 1,
            last_activity_date: None,
            last_daily_reward_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// `current == lifetime - spent`.
    pub fn is_balanced(&self) -> bool {
        self.current_points == self.lifetime_points - self.points_spent
    }
}

/// An append-only ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointTransaction {
    pub id: DbId,
    pub user_id: DbId,
    pub points: i64,
    pub transaction_type: TransactionType,
    pub reason: String,
    pub description: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<DbId>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// A ledger entry about to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPointTransaction {
    pub user_id: DbId,
    pub points: i64,
    pub transaction_type: TransactionType,
    pub reason: String,
    pub description: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<DbId>,
    pub metadata: Option<serde_json::Value>,
}

/// Per-user, per-activity milestone counter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MilestoneRecord {
    pub user_id: DbId,
    pub activity_type: ActivityType,
    pub total_logs: i64,
    pub milestone_level: i32,
    pub points_multiplier: f64,
    pub updated_at: Timestamp,
}

/// An earned achievement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Achievement {
    pub id: DbId,
    pub user_id: DbId,
    pub achievement_code: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub points_awarded: i64,
    pub earned_at: Timestamp,
}

/// An achievement about to be granted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAchievement {
    pub user_id: DbId,
    pub achievement_code: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub points_awarded: i64,
}

/// One leaderboard row, ranked by lifetime points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub user_id: DbId,
    pub lifetime_points: i64,
    pub level: i32,
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const DEFAULT_DAILY_LOGIN_POINTS: i64 = 25;
pub const DEFAULT_LEVEL_UP_BONUS: i64 = 250;
pub const DEFAULT_FOOD_LOG_POINTS: i64 = 10;
pub const DEFAULT_WEIGHT_LOG_POINTS: i64 = 20;

/// Fixed point amounts granted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardAmounts {
    pub daily_login: i64,
    /// Bonus for both account level-ups and milestone level-ups.
    pub level_up_bonus: i64,
    pub food_log: i64,
    pub weight_log: i64,
}

impl Default for RewardAmounts {
    fn default() -> Self {
        Self {
            daily_login: DEFAULT_DAILY_LOGIN_POINTS,
            level_up_bonus: DEFAULT_LEVEL_UP_BONUS,
            food_log: DEFAULT_FOOD_LOG_POINTS,
            weight_log: DEFAULT_WEIGHT_LOG_POINTS,
        }
    }
}

impl RewardAmounts {
    /// Base points for one log of `activity`, before the milestone multiplier.
    pub fn base_for(&self, activity: ActivityType) -> i64 {
        match activity {
            ActivityType::Food => self.food_log,
            ActivityType::Weight => self.weight_log,
        }
    }
}

/// Immutable tables and amounts injected into the engine.
#[derive(Debug, Clone)]
pub struct PointsConfig {
    pub levels: LevelTable,
    pub food_milestones: MilestoneTable,
    pub weight_milestones: MilestoneTable,
    pub rewards: RewardAmounts,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self::with_rewards(RewardAmounts::default())
    }
}

impl PointsConfig {
    /// Built-in tables with the given reward amounts.
    pub fn with_rewards(rewards: RewardAmounts) -> Self {
        Self {
            levels: LevelTable::default(),
            food_milestones: MilestoneTable::food(),
            weight_milestones: MilestoneTable::weight(),
            rewards,
        }
    }

    pub fn milestones_for(&self, activity: ActivityType) -> &MilestoneTable {
        match activity {
            ActivityType::Food => &self.food_milestones,
            ActivityType::Weight => &self.weight_milestones,
        }
    }
}

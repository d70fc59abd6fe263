//! Activity milestone tiers and reward multipliers.
//!
//! Each activity type (food logging, weight logging) has its own ordered
//! threshold table. A tier is selected by scanning from the highest
//! threshold downward for the first one the log count has reached.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Activity types that count towards milestones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Food,
    Weight,
}

impl ActivityType {
    pub const ALL: [ActivityType; 2] = [ActivityType::Food, ActivityType::Weight];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Weight => "weight",
        }
    }

    /// Parse from a path segment or stored name.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "food" => Ok(Self::Food),
            "weight" => Ok(Self::Weight),
            other => Err(CoreError::Validation(format!(
                "Unknown activity type '{other}'. Must be one of: food, weight"
            ))),
        }
    }

    /// Transaction reason for the per-log award.
    pub fn log_reason(self) -> &'static str {
        match self {
            Self::Food => "food_log",
            Self::Weight => "weight_log",
        }
    }

    /// Transaction reason for a milestone level-up bonus.
    pub fn milestone_reason(self) -> &'static str {
        match self {
            Self::Food => "food_milestone_level_up",
            Self::Weight => "weight_milestone_level_up",
        }
    }
}

/// One row of a milestone table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MilestoneTier {
    pub log_threshold: i64,
    pub level: i32,
    pub multiplier: f64,
}

const fn tier(log_threshold: i64, level: i32, multiplier: f64) -> MilestoneTier {
    MilestoneTier {
        log_threshold,
        level,
        multiplier,
    }
}

pub const FOOD_MILESTONES: &[MilestoneTier] = &[
    tier(0, 1, 1.0),
    tier(10, 2, 1.1),
    tier(25, 3, 1.2),
    tier(50, 4, 1.3),
    tier(100, 5, 1.4),
    tier(200, 6, 1.5),
    tier(350, 7, 1.6),
    tier(500, 8, 1.7),
    tier(750, 9, 1.8),
    tier(1000, 10, 1.9),
    tier(1500, 11, 2.0),
    tier(2000, 12, 2.1),
];

pub const WEIGHT_MILESTONES: &[MilestoneTier] = &[
    tier(0, 1, 1.0),
    tier(5, 2, 1.1),
    tier(10, 3, 1.2),
    tier(20, 4, 1.3),
    tier(35, 5, 1.4),
    tier(50, 6, 1.5),
    tier(75, 7, 1.6),
    tier(100, 8, 1.7),
    tier(150, 9, 1.8),
    tier(200, 10, 1.9),
    tier(300, 11, 2.0),
    tier(400, 12, 2.1),
];

/// An ascending milestone table for a single activity type.
#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneTable {
    tiers: Vec<MilestoneTier>,
}

impl MilestoneTable {
    /// Build a table. Thresholds and levels must ascend strictly, the first
    /// tier must start at 0 logs, and multipliers may never decrease.
    pub fn new(tiers: Vec<MilestoneTier>) -> Result<Self, CoreError> {
        match tiers.first() {
            Some(first) if first.log_threshold == 0 && first.multiplier >= 1.0 => {}
            _ => {
                return Err(CoreError::Validation(
                    "Milestone table must start at 0 logs with a multiplier of at least 1.0"
                        .into(),
                ))
            }
        }
        let ordered = tiers.windows(2).all(|w| {
            w[0].log_threshold < w[1].log_threshold
                && w[0].level < w[1].level
                && w[0].multiplier <= w[1].multiplier
        });
        if !ordered {
            return Err(CoreError::Validation(
                "Milestone tiers must ascend in threshold, level and multiplier".into(),
            ));
        }
        Ok(Self { tiers })
    }

    pub fn food() -> Self {
        Self {
            tiers: FOOD_MILESTONES.to_vec(),
        }
    }

    pub fn weight() -> Self {
        Self {
            tiers: WEIGHT_MILESTONES.to_vec(),
        }
    }

    /// The tier reached at `total_logs`.
    pub fn tier_for(&self, total_logs: i64) -> MilestoneTier {
        self.tiers
            .iter()
            .rev()
            .find(|t| t.log_threshold <= total_logs)
            .copied()
            .unwrap_or(self.tiers[0])
    }

    /// The first tier, used for freshly created records.
    pub fn base_tier(&self) -> MilestoneTier {
        self.tiers[0]
    }

    pub fn tiers(&self) -> &[MilestoneTier] {
        &self.tiers
    }
}

/// `round(base_points * multiplier)`, rounding halves away from zero.
pub fn apply_multiplier(base_points: i64, multiplier: f64) -> i64 {
    (base_points as f64 * multiplier).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_record_is_base_tier() {
        let tier = MilestoneTable::food().tier_for(0);
        assert_eq!(tier.level, 1);
        assert_eq!(tier.multiplier, 1.0);
    }

    #[test]
    fn tenth_food_log_reaches_level_two() {
        let table = MilestoneTable::food();
        assert_eq!(table.tier_for(9).level, 1);
        let tier = table.tier_for(10);
        assert_eq!(tier.level, 2);
        assert_eq!(tier.multiplier, 1.1);
    }

    #[test]
    fn weight_table_tops_out_at_four_hundred_logs() {
        let table = MilestoneTable::weight();
        assert_eq!(table.tier_for(399).level, 11);
        let top = table.tier_for(400);
        assert_eq!(top.level, 12);
        assert_eq!(top.multiplier, 2.1);
        assert_eq!(table.tier_for(10_000).level, 12);
    }

    #[test]
    fn multiplier_is_monotonic_in_log_count() {
        for table in [MilestoneTable::food(), MilestoneTable::weight()] {
            let mut previous = table.tier_for(0).multiplier;
            for logs in 0..2500 {
                let multiplier = table.tier_for(logs).multiplier;
                assert!(multiplier >= previous, "multiplier dropped at {logs}");
                previous = multiplier;
            }
        }
    }

    #[test]
    fn builtin_tables_pass_validation() {
        assert!(MilestoneTable::new(FOOD_MILESTONES.to_vec()).is_ok());
        assert!(MilestoneTable::new(WEIGHT_MILESTONES.to_vec()).is_ok());
    }

    #[test]
    fn rejects_decreasing_multiplier() {
        let tiers = vec![tier(0, 1, 1.0), tier(5, 2, 0.9)];
        assert!(MilestoneTable::new(tiers).is_err());
    }

    #[test]
    fn apply_multiplier_rounds_half_up() {
        assert_eq!(apply_multiplier(10, 1.0), 10);
        assert_eq!(apply_multiplier(10, 1.1), 11);
        assert_eq!(apply_multiplier(25, 1.1), 28);
        assert_eq!(apply_multiplier(20, 2.1), 42);
    }

    #[test]
    fn activity_type_parses_known_names() {
        assert_eq!(ActivityType::from_name("food").unwrap(), ActivityType::Food);
        assert_eq!(
            ActivityType::from_name("weight").unwrap(),
            ActivityType::Weight
        );
        assert!(ActivityType::from_name("water").is_err());
    }
}

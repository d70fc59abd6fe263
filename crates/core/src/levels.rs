//! Account level table.
//!
//! Levels are unlocked by cumulative lifetime points. Pure logic; the engine
//! decides when to re-evaluate.

use serde::Serialize;

use crate::error::CoreError;

/// Lifetime-point thresholds for levels 1..=10.
pub const DEFAULT_LEVEL_THRESHOLDS: &[i64] =
    &[0, 1000, 2500, 5000, 10000, 20000, 35000, 55000, 80000, 110000];

/// Ascending lifetime-point thresholds; index `i` unlocks level `i + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelTable {
    thresholds: Vec<i64>,
}

/// Where an account sits inside its current level band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelProgress {
    pub level: i32,
    pub current_threshold: i64,
    pub next_level: Option<i32>,
    pub next_threshold: Option<i64>,
    pub points_to_next_level: i64,
    pub progress_percent: f64,
}

impl LevelTable {
    /// Build a table, rejecting empty, non-zero-based, or non-ascending input.
    pub fn new(thresholds: Vec<i64>) -> Result<Self, CoreError> {
        match thresholds.first() {
            Some(0) => {}
            _ => {
                return Err(CoreError::Validation(
                    "Level table must start with a threshold of 0".into(),
                ))
            }
        }
        if thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(CoreError::Validation(
                "Level thresholds must be strictly ascending".into(),
            ));
        }
        Ok(Self { thresholds })
    }

    /// Highest reachable level.
    pub fn max_level(&self) -> i32 {
        self.thresholds.len() as i32
    }

    /// Highest level whose threshold is `<= lifetime_points`.
    pub fn calculate_level(&self, lifetime_points: i64) -> i32 {
        self.thresholds
            .iter()
            .rposition(|&t| t <= lifetime_points)
            .map_or(1, |idx| idx as i32 + 1)
    }

    /// Threshold at which `level` is unlocked, if the level exists.
    pub fn threshold_for(&self, level: i32) -> Option<i64> {
        if level < 1 {
            return None;
        }
        self.thresholds.get(level as usize - 1).copied()
    }

    /// Progress of `lifetime_points` towards the next level.
    pub fn progress(&self, lifetime_points: i64) -> LevelProgress {
        let level = self.calculate_level(lifetime_points);
        let current_threshold = self.threshold_for(level).unwrap_or(0);

        match self.threshold_for(level + 1) {
            Some(next_threshold) => {
                let band = (next_threshold - current_threshold) as f64;
                let into = (lifetime_points - current_threshold) as f64;
                LevelProgress {
                    level,
                    current_threshold,
                    next_level: Some(level + 1),
                    next_threshold: Some(next_threshold),
                    points_to_next_level: next_threshold - lifetime_points,
                    progress_percent: round_tenth(into / band * 100.0),
                }
            }
            None => LevelProgress {
                level,
                current_threshold,
                next_level: None,
                next_threshold: None,
                points_to_next_level: 0,
                progress_percent: 100.0,
            },
        }
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_LEVEL_THRESHOLDS.to_vec(),
        }
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_points_is_level_one() {
        assert_eq!(LevelTable::default().calculate_level(0), 1);
    }

    #[test]
    fn level_boundaries_are_inclusive() {
        let table = LevelTable::default();
        assert_eq!(table.calculate_level(999), 1);
        assert_eq!(table.calculate_level(1000), 2);
        assert_eq!(table.calculate_level(1010), 2);
        assert_eq!(table.calculate_level(2500), 3);
    }

    #[test]
    fn top_level_is_terminal() {
        let table = LevelTable::default();
        assert_eq!(table.calculate_level(110_000), 10);
        assert_eq!(table.calculate_level(5_000_000), 10);
        assert_eq!(table.max_level(), 10);
    }

    #[test]
    fn calculate_level_is_monotonic() {
        let table = LevelTable::default();
        let mut previous = table.calculate_level(0);
        for points in (0..130_000).step_by(37) {
            let level = table.calculate_level(points);
            assert!(level >= previous, "level dropped at {points}");
            previous = level;
        }
    }

    #[test]
    fn rejects_tables_not_starting_at_zero() {
        assert!(LevelTable::new(vec![10, 20]).is_err());
        assert!(LevelTable::new(vec![]).is_err());
    }

    #[test]
    fn rejects_non_ascending_tables() {
        assert!(LevelTable::new(vec![0, 100, 100]).is_err());
        assert!(LevelTable::new(vec![0, 100, 50]).is_err());
    }

    #[test]
    fn progress_within_band() {
        let progress = LevelTable::default().progress(1750);
        assert_eq!(progress.level, 2);
        assert_eq!(progress.next_threshold, Some(2500));
        assert_eq!(progress.points_to_next_level, 750);
        assert_eq!(progress.progress_percent, 50.0);
    }

    #[test]
    fn progress_at_top_level_is_complete() {
        let progress = LevelTable::default().progress(200_000);
        assert_eq!(progress.level, 10);
        assert_eq!(progress.next_level, None);
        assert_eq!(progress.points_to_next_level, 0);
        assert_eq!(progress.progress_percent, 100.0);
    }
}

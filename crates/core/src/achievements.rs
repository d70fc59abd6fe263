//! Built-in achievement definitions.
//!
//! Achievements are unique per user and code; the definitions here are the
//! ones the engine awards on its own. Arbitrary codes may still be awarded
//! through the engine as long as they pass [`validate_achievement_code`].

use serde::Serialize;

use crate::error::CoreError;
use crate::milestones::ActivityType;

pub const FIRST_FOOD_LOG: &str = "FIRST_FOOD_LOG";
pub const FIRST_WEIGHT_LOG: &str = "FIRST_WEIGHT_LOG";

/// Maximum length of an achievement code.
pub const MAX_CODE_LEN: usize = 64;

/// Static description of an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AchievementDefinition {
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub points: i64,
}

pub const BUILTIN_ACHIEVEMENTS: &[AchievementDefinition] = &[
    AchievementDefinition {
        code: FIRST_FOOD_LOG,
        name: "First Bite",
        description: "Logged your first meal",
        icon: "🍎",
        points: 500,
    },
    AchievementDefinition {
        code: FIRST_WEIGHT_LOG,
        name: "On the Scale",
        description: "Logged your first weight entry",
        icon: "⚖️",
        points: 500,
    },
];

/// The achievement granted for the first log of `activity`.
pub fn first_log_achievement(activity: ActivityType) -> &'static AchievementDefinition {
    let code = match activity {
        ActivityType::Food => FIRST_FOOD_LOG,
        ActivityType::Weight => FIRST_WEIGHT_LOG,
    };
    find_builtin(code).unwrap_or(&BUILTIN_ACHIEVEMENTS[0])
}

/// Look up a built-in definition by code.
pub fn find_builtin(code: &str) -> Option<&'static AchievementDefinition> {
    BUILTIN_ACHIEVEMENTS.iter().find(|a| a.code == code)
}

/// Codes are non-empty `UPPER_SNAKE_CASE` up to [`MAX_CODE_LEN`] characters.
pub fn validate_achievement_code(code: &str) -> Result<(), CoreError> {
    let well_formed = !code.is_empty()
        && code.len() <= MAX_CODE_LEN
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    if well_formed {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid achievement code '{code}'. Expected UPPER_SNAKE_CASE, at most {MAX_CODE_LEN} characters"
        )))
    }
}

//! `user_achievements` rows.

use caltrack_core::points::Achievement;
use caltrack_core::types::{DbId, Timestamp};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct AchievementRow {
    pub id: DbId,
    pub user_id: DbId,
    pub achievement_code: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub points_awarded: i64,
    pub earned_at: Timestamp,
}

impl From<AchievementRow> for Achievement {
    fn from(row: AchievementRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            achievement_code: row.achievement_code,
            name: row.name,
            description: row.description,
            icon: row.icon,
            points_awarded: row.points_awarded,
            earned_at: row.earned_at,
        }
    }
}

//! `food_log_milestones` / `weight_log_milestones` rows.
//!
//! Both tables share one shape; the activity type is implied by the table.

use caltrack_core::milestones::ActivityType;
use caltrack_core::points::MilestoneRecord;
use caltrack_core::types::{DbId, Timestamp};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct MilestoneRow {
    pub user_id: DbId,
    pub total_logs: i64,
    pub milestone_level: i32,
    pub points_multiplier: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MilestoneRow {
    pub fn into_record(self, activity: ActivityType) -> MilestoneRecord {
        MilestoneRecord {
            user_id: self.user_id,
            activity_type: activity,
            total_logs: self.total_logs,
            milestone_level: self.milestone_level,
            points_multiplier: self.points_multiplier,
            updated_at: self.updated_at,
        }
    }
}

//! Repository for `food_log_milestones` and `weight_log_milestones`.

use caltrack_core::milestones::{ActivityType, MilestoneTier};
use caltrack_core::points::MilestoneRecord;
use caltrack_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::milestone::MilestoneRow;

const COLUMNS: &str = "user_id, total_logs, milestone_level, points_multiplier, created_at, updated_at";

fn table(activity: ActivityType) -> &'static str {
    match activity {
        ActivityType::Food => "food_log_milestones",
        ActivityType::Weight => "weight_log_milestones",
    }
}

pub struct MilestoneRepo;

impl MilestoneRepo {
    pub async fn find(
        pool: &PgPool,
        user_id: DbId,
        activity: ActivityType,
    ) -> Result<Option<MilestoneRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM {} WHERE user_id = $1", table(activity));
        sqlx::query_as::<_, MilestoneRow>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Create the record at zero logs on the base tier if absent, then lock it.
    pub async fn lock_or_create(
        conn: &mut PgConnection,
        user_id: DbId,
        activity: ActivityType,
        base: MilestoneTier,
    ) -> Result<MilestoneRow, sqlx::Error> {
        let table = table(activity);
        let insert = format!(
            "INSERT INTO {table} (user_id, total_logs, milestone_level, points_multiplier) \
             VALUES ($1, 0, $2, $3) ON CONFLICT (user_id) DO NOTHING"
        );
        sqlx::query(&insert)
            .bind(user_id)
            .bind(base.level)
            .bind(base.multiplier)
            .execute(&mut *conn)
            .await?;

        let select = format!("SELECT {COLUMNS} FROM {table} WHERE user_id = $1 FOR UPDATE");
        sqlx::query_as::<_, MilestoneRow>(&select)
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn save(conn: &mut PgConnection, record: &MilestoneRecord) -> Result<(), sqlx::Error> {
        let query = format!(
            "UPDATE {} SET total_logs = $2, milestone_level = $3, points_multiplier = $4, \
                updated_at = NOW() \
             WHERE user_id = $1",
            table(record.activity_type)
        );
        sqlx::query(&query)
            .bind(record.user_id)
            .bind(record.total_logs)
            .bind(record.milestone_level)
            .bind(record.points_multiplier)
            .execute(conn)
            .await?;
        Ok(())
    }
}

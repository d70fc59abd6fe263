//! Repository for the `user_achievements` table.

use caltrack_core::points::NewAchievement;
use caltrack_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::achievement::AchievementRow;

const COLUMNS: &str =
    "id, user_id, achievement_code, name, description, icon, points_awarded, earned_at";

pub struct AchievementRepo;

impl AchievementRepo {
    /// Insert unless the user already holds the code. Returns `None` on a
    /// duplicate; a concurrent insert of the same code blocks until the other
    /// transaction ends and then yields `None` as well.
    pub async fn insert_if_absent(
        conn: &mut PgConnection,
        input: &NewAchievement,
    ) -> Result<Option<AchievementRow>, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_achievements \
                (user_id, achievement_code, name, description, icon, points_awarded) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (user_id, achievement_code) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AchievementRow>(&query)
            .bind(input.user_id)
            .bind(&input.achievement_code)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.icon)
            .bind(input.points_awarded)
            .fetch_optional(conn)
            .await
    }

    /// Oldest first.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<AchievementRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_achievements WHERE user_id = $1 ORDER BY earned_at, id"
        );
        sqlx::query_as::<_, AchievementRow>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}

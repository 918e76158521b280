use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Goal lifecycle status. Union of the statuses the original web and API
/// copies carried; stored as a Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "goal_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    Todo,
    InProgress,
    Completed,
    OnHold,
    Cancelled,
}

impl GoalStatus {
    pub const ALL: [GoalStatus; 5] = [
        GoalStatus::Todo,
        GoalStatus::InProgress,
        GoalStatus::Completed,
        GoalStatus::OnHold,
        GoalStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Todo => "TODO",
            GoalStatus::InProgress => "IN_PROGRESS",
            GoalStatus::Completed => "COMPLETED",
            GoalStatus::OnHold => "ON_HOLD",
            GoalStatus::Cancelled => "CANCELLED",
        }
    }
}

impl Default for GoalStatus {
    fn default() -> Self {
        GoalStatus::Todo
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub target_date: Option<Date>,
    pub status: GoalStatus,
    pub progress: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const GOAL_COLUMNS: &str =
    "id, user_id, title, description, category, target_date, status, progress, created_at, updated_at";

impl Goal {
    pub async fn list_by_user(
        db: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Goal>> {
        let rows = sqlx::query_as::<_, Goal>(&format!(
            r#"
            SELECT {GOAL_COLUMNS}
            FROM goals
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list_by_category(
        db: &PgPool,
        user_id: Uuid,
        category: &str,
    ) -> anyhow::Result<Vec<Goal>> {
        let rows = sqlx::query_as::<_, Goal>(&format!(
            r#"
            SELECT {GOAL_COLUMNS}
            FROM goals
            WHERE user_id = $1 AND category = $2
            ORDER BY created_at DESC
            "#,
        ))
        .bind(user_id)
        .bind(category)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Ownership filter: lookups are always by (id, user_id), so another
    /// user's goal and a nonexistent goal are the same `None`.
    pub async fn find_one(db: &PgPool, id: Uuid, user_id: Uuid) -> anyhow::Result<Option<Goal>> {
        let goal = sqlx::query_as::<_, Goal>(&format!(
            r#"
            SELECT {GOAL_COLUMNS}
            FROM goals
            WHERE id = $1 AND user_id = $2
            "#,
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(goal)
    }

    /// Create a goal owned by `user_id`. The owner always comes from the
    /// caller's session, never from the request body.
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        title: &str,
        description: Option<&str>,
        category: Option<&str>,
        target_date: Option<Date>,
    ) -> anyhow::Result<Goal> {
        let goal = sqlx::query_as::<_, Goal>(&format!(
            r#"
            INSERT INTO goals (user_id, title, description, category, target_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {GOAL_COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(title)
        .bind(description)
        .bind(category)
        .bind(target_date)
        .fetch_one(db)
        .await?;
        Ok(goal)
    }

    /// Partial update; absent fields keep their stored value.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
        title: Option<&str>,
        description: Option<&str>,
        category: Option<&str>,
        target_date: Option<Date>,
        status: Option<GoalStatus>,
        progress: Option<i32>,
    ) -> anyhow::Result<Option<Goal>> {
        let goal = sqlx::query_as::<_, Goal>(&format!(
            r#"
            UPDATE goals
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                category = COALESCE($5, category),
                target_date = COALESCE($6, target_date),
                status = COALESCE($7, status),
                progress = COALESCE($8, progress),
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {GOAL_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(user_id)
        .bind(title)
        .bind(description)
        .bind(category)
        .bind(target_date)
        .bind(status)
        .bind(progress)
        .fetch_optional(db)
        .await?;
        Ok(goal)
    }

    pub async fn update_status(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
        status: GoalStatus,
    ) -> anyhow::Result<Option<Goal>> {
        let goal = sqlx::query_as::<_, Goal>(&format!(
            r#"
            UPDATE goals
            SET status = $3, updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {GOAL_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(user_id)
        .bind(status)
        .fetch_optional(db)
        .await?;
        Ok(goal)
    }

    pub async fn update_progress(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
        progress: i32,
    ) -> anyhow::Result<Option<Goal>> {
        let goal = sqlx::query_as::<_, Goal>(&format!(
            r#"
            UPDATE goals
            SET progress = $3, updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {GOAL_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(user_id)
        .bind(progress)
        .fetch_optional(db)
        .await?;
        Ok(goal)
    }

    pub async fn delete(db: &PgPool, id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"DELETE FROM goals WHERE id = $1 AND user_id = $2"#)
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Distinct categories across the caller's own goals.
    pub async fn categories(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<String>> {
        let rows = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT category
            FROM goals
            WHERE user_id = $1 AND category IS NOT NULL
            ORDER BY category
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_to_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&GoalStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert_eq!(
            serde_json::from_str::<GoalStatus>("\"ON_HOLD\"").unwrap(),
            GoalStatus::OnHold
        );
    }

    #[test]
    fn status_defaults_to_todo() {
        assert_eq!(GoalStatus::default(), GoalStatus::Todo);
    }

    #[test]
    fn status_as_str_matches_serde_form() {
        for status in GoalStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}

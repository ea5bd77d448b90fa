//! Habit and habit-log repository
//!
//! A habit has at most one log per calendar day; logging the same day twice
//! overwrites the earlier entry.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{delete_owned, paginate, DbError};
use crate::models::{Paginated, Pagination};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Habit {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct HabitInput {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub archived: bool,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HabitLog {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub habit_id: Uuid,
    pub log_date: NaiveDate,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct HabitRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> HabitRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        include_archived: bool,
        page: Pagination,
    ) -> Result<Paginated<Habit>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT *, COUNT(*) OVER() AS total
            FROM habits
            WHERE user_id = $1 AND ($2 OR NOT archived)
            ORDER BY archived, name
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(include_archived)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        paginate(rows, page)
    }

    pub async fn active(&self, user_id: Uuid) -> Result<Vec<Habit>, DbError> {
        let rows = sqlx::query_as::<_, Habit>(
            "SELECT * FROM habits WHERE user_id = $1 AND NOT archived ORDER BY name",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Habit, DbError> {
        sqlx::query_as::<_, Habit>("SELECT * FROM habits WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("habit", id))
    }

    /// Habit names are unique per user.
    pub async fn create(&self, user_id: Uuid, input: HabitInput) -> Result<Habit, DbError> {
        let habit = sqlx::query_as::<_, Habit>(
            r#"
            INSERT INTO habits (user_id, name, description, color, archived)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.color)
        .bind(input.archived)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(habit_id = %habit.id, "habit created");
        Ok(habit)
    }

    pub async fn update(&self, user_id: Uuid, id: Uuid, input: HabitInput) -> Result<Habit, DbError> {
        sqlx::query_as::<_, Habit>(
            r#"
            UPDATE habits SET
                name = $3, description = $4, color = $5, archived = $6, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.color)
        .bind(input.archived)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("habit", id))
    }

    /// Deleting a habit cascades to its logs.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), DbError> {
        delete_owned(self.pool, "habits", "habit", user_id, id).await
    }

    // ---- logs ----

    /// Logs in an optional inclusive date range, newest first.
    pub async fn logs(
        &self,
        user_id: Uuid,
        habit_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<HabitLog>, DbError> {
        self.get(user_id, habit_id).await?;

        let rows = sqlx::query_as::<_, HabitLog>(
            r#"
            SELECT * FROM habit_logs
            WHERE user_id = $1 AND habit_id = $2
              AND ($3::date IS NULL OR log_date >= $3)
              AND ($4::date IS NULL OR log_date <= $4)
            ORDER BY log_date DESC
            "#,
        )
        .bind(user_id)
        .bind(habit_id)
        .bind(from)
        .bind(to)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Insert or overwrite the log for `log_date`.
    pub async fn upsert_log(
        &self,
        user_id: Uuid,
        habit_id: Uuid,
        log_date: NaiveDate,
        completed: bool,
    ) -> Result<HabitLog, DbError> {
        self.get(user_id, habit_id).await?;

        let log = sqlx::query_as::<_, HabitLog>(
            r#"
            INSERT INTO habit_logs (user_id, habit_id, log_date, completed)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (habit_id, log_date)
            DO UPDATE SET completed = EXCLUDED.completed, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(habit_id)
        .bind(log_date)
        .bind(completed)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(habit_id = %habit_id, date = %log_date, completed, "habit logged");
        Ok(log)
    }

    pub async fn delete_log(&self, user_id: Uuid, habit_id: Uuid, log_date: NaiveDate) -> Result<(), DbError> {
        let result = sqlx::query(
            "DELETE FROM habit_logs WHERE user_id = $1 AND habit_id = $2 AND log_date = $3",
        )
        .bind(user_id)
        .bind(habit_id)
        .bind(log_date)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("habit log", log_date));
        }
        Ok(())
    }

    /// Dates with a completed log for one habit.
    pub async fn completed_dates(&self, user_id: Uuid, habit_id: Uuid) -> Result<Vec<NaiveDate>, DbError> {
        self.get(user_id, habit_id).await?;

        let dates = sqlx::query_scalar::<_, NaiveDate>(
            r#"
            SELECT log_date FROM habit_logs
            WHERE user_id = $1 AND habit_id = $2 AND completed
            ORDER BY log_date
            "#,
        )
        .bind(user_id)
        .bind(habit_id)
        .fetch_all(self.pool)
        .await?;

        Ok(dates)
    }

    /// Completed dates for every active habit, keyed by habit id.
    pub async fn completed_dates_by_habit(
        &self,
        user_id: Uuid,
    ) -> Result<HashMap<Uuid, Vec<NaiveDate>>, DbError> {
        let rows: Vec<(Uuid, NaiveDate)> = sqlx::query_as(
            r#"
            SELECT l.habit_id, l.log_date
            FROM habit_logs l
            JOIN habits h ON h.id = l.habit_id
            WHERE l.user_id = $1 AND l.completed AND NOT h.archived
            ORDER BY l.log_date
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let mut by_habit: HashMap<Uuid, Vec<NaiveDate>> = HashMap::new();
        for (habit_id, date) in rows {
            by_habit.entry(habit_id).or_default().push(date);
        }
        Ok(by_habit)
    }
}

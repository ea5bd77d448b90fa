//! Task repository
//!
//! Open tasks sort before done ones, then by due date and priority.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracker_core::{Priority, TaskStatus};
use uuid::Uuid;

use super::{delete_owned, paginate, DbError};
use crate::models::{Paginated, Pagination};

/// Task record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated task fields for create/update
#[derive(Debug, Clone)]
pub struct TaskInput {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
}

/// Optional list filters
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
}

/// Task repository
pub struct TaskRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> TaskRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        filter: &TaskFilter,
        page: Pagination,
    ) -> Result<Paginated<Task>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT *, COUNT(*) OVER() AS total
            FROM tasks
            WHERE user_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR priority = $3)
            ORDER BY
                (status = 'done'),
                due_date ASC NULLS LAST,
                CASE priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END,
                created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(user_id)
        .bind(filter.status)
        .bind(filter.priority)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        paginate(rows, page)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Task, DbError> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("task", id))
    }

    pub async fn create(&self, user_id: Uuid, input: TaskInput) -> Result<Task, DbError> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (user_id, title, description, priority, status, due_date, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, CASE WHEN $5 = 'done' THEN NOW() END)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.priority)
        .bind(input.status)
        .bind(input.due_date)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(task_id = %task.id, "task created");
        Ok(task)
    }

    /// Replace a task's fields. Moving into `done` stamps `completed_at`;
    /// moving out of it clears the stamp.
    pub async fn update(&self, user_id: Uuid, id: Uuid, input: TaskInput) -> Result<Task, DbError> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks SET
                title = $3,
                description = $4,
                priority = $5,
                status = $6,
                due_date = $7,
                completed_at = CASE
                    WHEN $6 = 'done' THEN COALESCE(completed_at, NOW())
                    ELSE NULL
                END,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.priority)
        .bind(input.status)
        .bind(input.due_date)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("task", id))
    }

    /// Flip between done and todo.
    pub async fn toggle(&self, user_id: Uuid, id: Uuid) -> Result<Task, DbError> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks SET
                status = CASE WHEN status = 'done' THEN 'todo' ELSE 'done' END,
                completed_at = CASE WHEN status = 'done' THEN NULL ELSE NOW() END,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("task", id))
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), DbError> {
        delete_owned(self.pool, "tasks", "task", user_id, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, migrations};

    async fn pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url).await.expect("pool creation failed");
        migrations::run(&pool).await.expect("migrations");
        pool
    }

    fn input(title: &str, status: TaskStatus) -> TaskInput {
        TaskInput {
            title: title.into(),
            description: None,
            priority: Priority::High,
            status,
            due_date: None,
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn rows_are_scoped_by_user() {
        let pool = pool().await;
        let repo = TaskRepo::new(&pool);
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let task = repo.create(owner, input("write report", TaskStatus::Todo)).await.unwrap();
        assert!(matches!(
            repo.get(stranger, task.id).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(repo.delete(stranger, task.id).await.is_err());
        repo.delete(owner, task.id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn toggle_stamps_completion() {
        let pool = pool().await;
        let repo = TaskRepo::new(&pool);
        let user = Uuid::new_v4();

        let task = repo.create(user, input("stretch", TaskStatus::Todo)).await.unwrap();
        assert!(task.completed_at.is_none());

        let done = repo.toggle(user, task.id).await.unwrap();
        assert_eq!(done.status, TaskStatus::Done);
        assert!(done.completed_at.is_some());

        let reopened = repo.toggle(user, task.id).await.unwrap();
        assert_eq!(reopened.status, TaskStatus::Todo);
        assert!(reopened.completed_at.is_none());
    }
}

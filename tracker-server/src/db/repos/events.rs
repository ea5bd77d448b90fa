//! Calendar event repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{delete_owned, paginate, DbError};
use crate::models::{Paginated, Pagination};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub all_day: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct EventInput {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub all_day: bool,
}

pub struct EventRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> EventRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Events overlapping `[from, to]`, in start order. Either bound may be
    /// open.
    pub async fn list(
        &self,
        user_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        page: Pagination,
    ) -> Result<Paginated<Event>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT *, COUNT(*) OVER() AS total
            FROM events
            WHERE user_id = $1
              AND ($2::timestamptz IS NULL OR COALESCE(ends_at, starts_at) >= $2)
              AND ($3::timestamptz IS NULL OR starts_at <= $3)
            ORDER BY starts_at, title
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        paginate(rows, page)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Event, DbError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("event", id))
    }

    pub async fn create(&self, user_id: Uuid, input: EventInput) -> Result<Event, DbError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (user_id, title, description, location, starts_at, ends_at, all_day)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.location)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(input.all_day)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(event_id = %event.id, "event created");
        Ok(event)
    }

    pub async fn update(&self, user_id: Uuid, id: Uuid, input: EventInput) -> Result<Event, DbError> {
        sqlx::query_as::<_, Event>(
            r#"
            UPDATE events SET
                title = $3, description = $4, location = $5, starts_at = $6,
                ends_at = $7, all_day = $8, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.location)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(input.all_day)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("event", id))
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), DbError> {
        delete_owned(self.pool, "events", "event", user_id, id).await
    }
}

//! Journal note repository

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{delete_owned, like_pattern, paginate, DbError};
use crate::models::{Paginated, Pagination};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Note {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub mood: Option<String>,
    pub entry_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Note fields. A missing `entry_date` defaults to today on create.
#[derive(Debug, Clone)]
pub struct NoteInput {
    pub title: String,
    pub content: String,
    pub mood: Option<String>,
    pub entry_date: Option<NaiveDate>,
}

pub struct NoteRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> NoteRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Newest entries first; `query` matches title or content.
    pub async fn list(
        &self,
        user_id: Uuid,
        query: Option<&str>,
        page: Pagination,
    ) -> Result<Paginated<Note>, DbError> {
        let pattern = query.map(like_pattern);
        let rows = sqlx::query(
            r#"
            SELECT *, COUNT(*) OVER() AS total
            FROM notes
            WHERE user_id = $1
              AND ($2::text IS NULL OR title ILIKE $2 OR content ILIKE $2)
            ORDER BY entry_date DESC, created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        paginate(rows, page)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Note, DbError> {
        sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("note", id))
    }

    pub async fn create(&self, user_id: Uuid, input: NoteInput) -> Result<Note, DbError> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (user_id, title, content, mood, entry_date)
            VALUES ($1, $2, $3, $4, COALESCE($5, CURRENT_DATE))
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(&input.mood)
        .bind(input.entry_date)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(note_id = %note.id, "note created");
        Ok(note)
    }

    pub async fn update(&self, user_id: Uuid, id: Uuid, input: NoteInput) -> Result<Note, DbError> {
        sqlx::query_as::<_, Note>(
            r#"
            UPDATE notes SET
                title = $3, content = $4, mood = $5,
                entry_date = COALESCE($6, entry_date),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(&input.mood)
        .bind(input.entry_date)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("note", id))
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), DbError> {
        delete_owned(self.pool, "notes", "note", user_id, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, migrations};

    #[tokio::test]
    #[ignore = "requires database"]
    async fn search_treats_wildcards_literally() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url).await.expect("pool creation failed");
        migrations::run(&pool).await.expect("migrations");

        let repo = NoteRepo::new(&pool);
        let user = Uuid::new_v4();
        for (title, content) in [("sale", "got 50% off"), ("walk", "50 minutes outside")] {
            repo.create(
                user,
                NoteInput {
                    title: title.into(),
                    content: content.into(),
                    mood: None,
                    entry_date: None,
                },
            )
            .await
            .unwrap();
        }

        let hits = repo.list(user, Some("50%"), Pagination::default()).await.unwrap();
        assert_eq!(hits.total, 1);
        assert_eq!(hits.items[0].title, "sale");
    }
}

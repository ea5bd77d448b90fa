//! Gallery repository. Items reference externally hosted images by URL.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{delete_owned, paginate, DbError};
use crate::models::{Paginated, Pagination};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GalleryItem {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub title: String,
    pub image_url: String,
    pub description: Option<String>,
    pub taken_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct GalleryInput {
    pub title: String,
    pub image_url: String,
    pub description: Option<String>,
    pub taken_on: Option<NaiveDate>,
}

pub struct GalleryRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> GalleryRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, user_id: Uuid, page: Pagination) -> Result<Paginated<GalleryItem>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT *, COUNT(*) OVER() AS total
            FROM gallery_items
            WHERE user_id = $1
            ORDER BY COALESCE(taken_on, created_at::date) DESC, created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        paginate(rows, page)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<GalleryItem, DbError> {
        sqlx::query_as::<_, GalleryItem>("SELECT * FROM gallery_items WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("gallery item", id))
    }

    pub async fn create(&self, user_id: Uuid, input: GalleryInput) -> Result<GalleryItem, DbError> {
        let item = sqlx::query_as::<_, GalleryItem>(
            r#"
            INSERT INTO gallery_items (user_id, title, image_url, description, taken_on)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&input.title)
        .bind(&input.image_url)
        .bind(&input.description)
        .bind(input.taken_on)
        .fetch_one(self.pool)
        .await?;

        Ok(item)
    }

    pub async fn update(&self, user_id: Uuid, id: Uuid, input: GalleryInput) -> Result<GalleryItem, DbError> {
        sqlx::query_as::<_, GalleryItem>(
            r#"
            UPDATE gallery_items SET
                title = $3, image_url = $4, description = $5, taken_on = $6,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.title)
        .bind(&input.image_url)
        .bind(&input.description)
        .bind(input.taken_on)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("gallery item", id))
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), DbError> {
        delete_owned(self.pool, "gallery_items", "gallery item", user_id, id).await
    }
}

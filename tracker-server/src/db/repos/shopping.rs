//! Shopping list repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{delete_owned, paginate, DbError};
use crate::models::{Paginated, Pagination};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShoppingItem {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub category: Option<String>,
    pub estimated_price: Option<Decimal>,
    pub is_purchased: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ShoppingInput {
    pub name: String,
    pub quantity: i32,
    pub category: Option<String>,
    pub estimated_price: Option<Decimal>,
    pub is_purchased: bool,
}

pub struct ShoppingRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ShoppingRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Items still to buy first, grouped by category.
    pub async fn list(&self, user_id: Uuid, page: Pagination) -> Result<Paginated<ShoppingItem>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT *, COUNT(*) OVER() AS total
            FROM shopping_items
            WHERE user_id = $1
            ORDER BY is_purchased, category NULLS LAST, name
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

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<ShoppingItem, DbError> {
        sqlx::query_as::<_, ShoppingItem>("SELECT * FROM shopping_items WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("shopping item", id))
    }

    pub async fn create(&self, user_id: Uuid, input: ShoppingInput) -> Result<ShoppingItem, DbError> {
        let item = sqlx::query_as::<_, ShoppingItem>(
            r#"
            INSERT INTO shopping_items (user_id, name, quantity, category, estimated_price, is_purchased)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&input.name)
        .bind(input.quantity)
        .bind(&input.category)
        .bind(input.estimated_price)
        .bind(input.is_purchased)
        .fetch_one(self.pool)
        .await?;

        Ok(item)
    }

    pub async fn update(&self, user_id: Uuid, id: Uuid, input: ShoppingInput) -> Result<ShoppingItem, DbError> {
        sqlx::query_as::<_, ShoppingItem>(
            r#"
            UPDATE shopping_items SET
                name = $3, quantity = $4, category = $5, estimated_price = $6,
                is_purchased = $7, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.name)
        .bind(input.quantity)
        .bind(&input.category)
        .bind(input.estimated_price)
        .bind(input.is_purchased)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("shopping item", id))
    }

    pub async fn toggle(&self, user_id: Uuid, id: Uuid) -> Result<ShoppingItem, DbError> {
        sqlx::query_as::<_, ShoppingItem>(
            r#"
            UPDATE shopping_items SET is_purchased = NOT is_purchased, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("shopping item", id))
    }

    /// Remove every purchased item; returns how many were deleted.
    pub async fn clear_purchased(&self, user_id: Uuid) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM shopping_items WHERE user_id = $1 AND is_purchased")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        tracing::info!(removed = result.rows_affected(), "cleared purchased items");
        Ok(result.rows_affected())
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), DbError> {
        delete_owned(self.pool, "shopping_items", "shopping item", user_id, id).await
    }
}

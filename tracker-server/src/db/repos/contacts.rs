//! Contact repository

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{delete_owned, like_pattern, paginate, DbError};
use crate::models::{Paginated, Pagination};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Contact {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ContactInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub notes: Option<String>,
}

pub struct ContactRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List contacts by name; `query` matches name, email or phone.
    pub async fn list(
        &self,
        user_id: Uuid,
        query: Option<&str>,
        page: Pagination,
    ) -> Result<Paginated<Contact>, DbError> {
        let pattern = query.map(like_pattern);
        let rows = sqlx::query(
            r#"
            SELECT *, COUNT(*) OVER() AS total
            FROM contacts
            WHERE user_id = $1
              AND ($2::text IS NULL
                   OR name ILIKE $2 OR email ILIKE $2 OR phone ILIKE $2)
            ORDER BY name
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

    pub async fn with_birthdays(&self, user_id: Uuid) -> Result<Vec<Contact>, DbError> {
        let rows = sqlx::query_as::<_, Contact>(
            "SELECT * FROM contacts WHERE user_id = $1 AND birthday IS NOT NULL",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Contact, DbError> {
        sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("contact", id))
    }

    pub async fn create(&self, user_id: Uuid, input: ContactInput) -> Result<Contact, DbError> {
        let contact = sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (user_id, name, email, phone, birthday, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.birthday)
        .bind(&input.notes)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(contact_id = %contact.id, "contact created");
        Ok(contact)
    }

    pub async fn update(&self, user_id: Uuid, id: Uuid, input: ContactInput) -> Result<Contact, DbError> {
        sqlx::query_as::<_, Contact>(
            r#"
            UPDATE contacts SET
                name = $3, email = $4, phone = $5, birthday = $6, notes = $7,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.birthday)
        .bind(&input.notes)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("contact", id))
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), DbError> {
        delete_owned(self.pool, "contacts", "contact", user_id, id).await
    }
}

//! Debt repository

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracker_core::finance::apply_debt_payment;
use tracker_core::DebtDirection;
use uuid::Uuid;

use super::{delete_owned, paginate, DbError};
use crate::models::{Paginated, Pagination};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Debt {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub name: String,
    pub direction: DebtDirection,
    pub total_amount: Decimal,
    pub remaining_amount: Decimal,
    pub interest_rate: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Debt fields. `remaining_amount` defaults to the total on create.
#[derive(Debug, Clone)]
pub struct DebtInput {
    pub name: String,
    pub direction: DebtDirection,
    pub total_amount: Decimal,
    pub remaining_amount: Option<Decimal>,
    pub interest_rate: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
}

pub struct DebtRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> DebtRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Outstanding debts first, then by due date.
    pub async fn list(&self, user_id: Uuid, page: Pagination) -> Result<Paginated<Debt>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT *, COUNT(*) OVER() AS total
            FROM debts
            WHERE user_id = $1
            ORDER BY (remaining_amount = 0), due_date ASC NULLS LAST, name
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

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Debt, DbError> {
        sqlx::query_as::<_, Debt>("SELECT * FROM debts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("debt", id))
    }

    pub async fn create(&self, user_id: Uuid, input: DebtInput) -> Result<Debt, DbError> {
        let debt = sqlx::query_as::<_, Debt>(
            r#"
            INSERT INTO debts
                (user_id, name, direction, total_amount, remaining_amount, interest_rate, due_date)
            VALUES ($1, $2, $3, $4, COALESCE($5, $4), $6, $7)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&input.name)
        .bind(input.direction)
        .bind(input.total_amount)
        .bind(input.remaining_amount)
        .bind(input.interest_rate)
        .bind(input.due_date)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(debt_id = %debt.id, "debt created");
        Ok(debt)
    }

    /// Replace fields. A missing `remaining_amount` keeps the stored
    /// balance, capped at the new `total_amount`.
    pub async fn update(&self, user_id: Uuid, id: Uuid, input: DebtInput) -> Result<Debt, DbError> {
        sqlx::query_as::<_, Debt>(
            r#"
            UPDATE debts SET
                name = $3, direction = $4, total_amount = $5,
                remaining_amount = LEAST(COALESCE($6, remaining_amount), $5),
                interest_rate = $7, due_date = $8, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.name)
        .bind(input.direction)
        .bind(input.total_amount)
        .bind(input.remaining_amount)
        .bind(input.interest_rate)
        .bind(input.due_date)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("debt", id))
    }

    /// Reduce the outstanding balance by `payment` (clamped at zero).
    pub async fn record_payment(&self, user_id: Uuid, id: Uuid, payment: Decimal) -> Result<Debt, DbError> {
        let mut tx = self.pool.begin().await?;

        let remaining: Decimal = sqlx::query_scalar(
            "SELECT remaining_amount FROM debts WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("debt", id))?;

        let new_remaining = apply_debt_payment(remaining, payment)?;

        let debt = sqlx::query_as::<_, Debt>(
            r#"
            UPDATE debts SET remaining_amount = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(new_remaining)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(debt_id = %id, remaining = %new_remaining, "debt payment recorded");
        Ok(debt)
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), DbError> {
        delete_owned(self.pool, "debts", "debt", user_id, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, migrations};
    use rust_decimal_macros::dec;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn overpayment_settles_at_zero() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url).await.expect("pool creation failed");
        migrations::run(&pool).await.expect("migrations");

        let repo = DebtRepo::new(&pool);
        let user = Uuid::new_v4();
        let debt = repo
            .create(
                user,
                DebtInput {
                    name: "loan from Sam".into(),
                    direction: DebtDirection::Owed,
                    total_amount: dec!(500),
                    remaining_amount: None,
                    interest_rate: None,
                    due_date: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(debt.remaining_amount, dec!(500));

        let debt = repo.record_payment(user, debt.id, dec!(200)).await.unwrap();
        assert_eq!(debt.remaining_amount, dec!(300));

        let debt = repo.record_payment(user, debt.id, dec!(1000)).await.unwrap();
        assert_eq!(debt.remaining_amount, dec!(0));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn lowering_total_caps_remaining() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url).await.expect("pool creation failed");
        migrations::run(&pool).await.expect("migrations");

        let repo = DebtRepo::new(&pool);
        let user = Uuid::new_v4();
        let input = |total, remaining| DebtInput {
            name: "credit card".into(),
            direction: DebtDirection::Owed,
            total_amount: total,
            remaining_amount: remaining,
            interest_rate: Some(dec!(19.99)),
            due_date: None,
        };

        let debt = repo.create(user, input(dec!(1000), Some(dec!(800)))).await.unwrap();

        let debt = repo.update(user, debt.id, input(dec!(600), None)).await.unwrap();
        assert_eq!(debt.total_amount, dec!(600));
        assert_eq!(debt.remaining_amount, dec!(600));

        let debt = repo.update(user, debt.id, input(dec!(900), None)).await.unwrap();
        assert_eq!(debt.remaining_amount, dec!(600));

        let err = repo
            .update(user, debt.id, input(dec!(900), Some(dec!(950))))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected { ref constraint } if constraint == "debts_remaining_within_total"));
    }
}

//! Recurring bill repository

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracker_core::Recurrence;
use uuid::Uuid;

use super::{delete_owned, paginate, DbError};
use crate::models::{Paginated, Pagination};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Bill {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub name: String,
    pub amount: Decimal,
    pub category: Option<String>,
    pub due_date: NaiveDate,
    /// Day of month recurring steps return to; set from `due_date`.
    #[serde(skip)]
    pub anchor_day: i16,
    pub recurrence: Recurrence,
    pub is_paid: bool,
    pub last_paid_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BillInput {
    pub name: String,
    pub amount: Decimal,
    pub category: Option<String>,
    pub due_date: NaiveDate,
    pub recurrence: Recurrence,
    /// `None` keeps the stored flag (new bills start unpaid).
    pub is_paid: Option<bool>,
}

fn anchor_day(date: NaiveDate) -> i16 {
    // day() is 1..=31
    date.day() as i16
}

pub struct BillRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> BillRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Unpaid bills first, soonest due first.
    pub async fn list(&self, user_id: Uuid, page: Pagination) -> Result<Paginated<Bill>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT *, COUNT(*) OVER() AS total
            FROM bills
            WHERE user_id = $1
            ORDER BY is_paid, due_date, name
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

    /// Unpaid bills due on or before `until` (overdue ones included).
    pub async fn upcoming(&self, user_id: Uuid, until: NaiveDate) -> Result<Vec<Bill>, DbError> {
        let rows = sqlx::query_as::<_, Bill>(
            r#"
            SELECT * FROM bills
            WHERE user_id = $1 AND NOT is_paid AND due_date <= $2
            ORDER BY due_date, name
            "#,
        )
        .bind(user_id)
        .bind(until)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Bill, DbError> {
        sqlx::query_as::<_, Bill>("SELECT * FROM bills WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("bill", id))
    }

    pub async fn create(&self, user_id: Uuid, input: BillInput) -> Result<Bill, DbError> {
        let bill = sqlx::query_as::<_, Bill>(
            r#"
            INSERT INTO bills
                (user_id, name, amount, category, due_date, anchor_day, recurrence, is_paid)
            VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, FALSE))
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&input.name)
        .bind(input.amount)
        .bind(&input.category)
        .bind(input.due_date)
        .bind(anchor_day(input.due_date))
        .bind(input.recurrence)
        .bind(input.is_paid)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(bill_id = %bill.id, "bill created");
        Ok(bill)
    }

    /// Replace a bill's fields. Editing `due_date` re-anchors the schedule;
    /// `is_paid` can reopen a bill that was closed by mistake.
    pub async fn update(&self, user_id: Uuid, id: Uuid, input: BillInput) -> Result<Bill, DbError> {
        sqlx::query_as::<_, Bill>(
            r#"
            UPDATE bills SET
                name = $3, amount = $4, category = $5,
                anchor_day = CASE WHEN due_date = $6 THEN anchor_day ELSE $7 END,
                due_date = $6,
                recurrence = $8,
                is_paid = COALESCE($9, is_paid),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.name)
        .bind(input.amount)
        .bind(&input.category)
        .bind(input.due_date)
        .bind(anchor_day(input.due_date))
        .bind(input.recurrence)
        .bind(input.is_paid)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("bill", id))
    }

    /// Record a payment made on `paid_on`.
    ///
    /// Recurring bills roll their due date forward one period and stay
    /// unpaid; one-off bills are marked paid.
    pub async fn mark_paid(&self, user_id: Uuid, id: Uuid, paid_on: NaiveDate) -> Result<Bill, DbError> {
        let mut tx = self.pool.begin().await?;

        let bill = sqlx::query_as::<_, Bill>(
            "SELECT * FROM bills WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("bill", id))?;

        let anchor = u32::try_from(bill.anchor_day).unwrap_or_else(|_| bill.due_date.day());
        let next_due = bill.recurrence.next_due(bill.due_date, anchor);
        let updated = sqlx::query_as::<_, Bill>(
            r#"
            UPDATE bills SET
                due_date = COALESCE($2, due_date),
                is_paid = $3,
                last_paid_on = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(next_due)
        .bind(next_due.is_none())
        .bind(paid_on)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(bill_id = %id, next_due = ?next_due, "bill paid");
        Ok(updated)
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), DbError> {
        delete_owned(self.pool, "bills", "bill", user_id, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, migrations};
    use rust_decimal_macros::dec;

    async fn pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url).await.expect("pool creation failed");
        migrations::run(&pool).await.expect("migrations");
        pool
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn paying_monthly_bill_advances_due_date() {
        let pool = pool().await;
        let repo = BillRepo::new(&pool);
        let user = Uuid::new_v4();

        let bill = repo
            .create(
                user,
                BillInput {
                    name: "rent".into(),
                    amount: dec!(1200),
                    category: None,
                    due_date: date(2024, 1, 31),
                    recurrence: Recurrence::Monthly,
                    is_paid: None,
                },
            )
            .await
            .unwrap();

        let paid = repo.mark_paid(user, bill.id, date(2024, 1, 30)).await.unwrap();
        assert_eq!(paid.due_date, date(2024, 2, 29));
        assert!(!paid.is_paid);
        assert_eq!(paid.last_paid_on, Some(date(2024, 1, 30)));

        let paid = repo.mark_paid(user, bill.id, date(2024, 2, 28)).await.unwrap();
        assert_eq!(paid.due_date, date(2024, 3, 31));
        let paid = repo.mark_paid(user, bill.id, date(2024, 3, 30)).await.unwrap();
        assert_eq!(paid.due_date, date(2024, 4, 30));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn paying_one_off_bill_closes_it() {
        let pool = pool().await;
        let repo = BillRepo::new(&pool);
        let user = Uuid::new_v4();

        let bill = repo
            .create(
                user,
                BillInput {
                    name: "car repair".into(),
                    amount: dec!(340.50),
                    category: Some("car".into()),
                    due_date: date(2024, 6, 1),
                    recurrence: Recurrence::None,
                    is_paid: None,
                },
            )
            .await
            .unwrap();

        let paid = repo.mark_paid(user, bill.id, date(2024, 6, 1)).await.unwrap();
        assert!(paid.is_paid);
        assert_eq!(paid.due_date, date(2024, 6, 1));
        assert!(repo.upcoming(user, date(2024, 12, 31)).await.unwrap().is_empty());

        let reopened = repo
            .update(
                user,
                bill.id,
                BillInput {
                    name: "car repair".into(),
                    amount: dec!(340.50),
                    category: Some("car".into()),
                    due_date: date(2024, 6, 1),
                    recurrence: Recurrence::None,
                    is_paid: Some(false),
                },
            )
            .await
            .unwrap();
        assert!(!reopened.is_paid);
        assert_eq!(repo.upcoming(user, date(2024, 12, 31)).await.unwrap().len(), 1);
    }
}

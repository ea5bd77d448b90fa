//! Transaction and budget repository

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracker_core::{LedgerEntry, MonthKey, TransactionKind};
use uuid::Uuid;

use super::{delete_owned, paginate, DbError};
use crate::models::{Paginated, Pagination};

/// Transaction record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Transaction {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub category: String,
    pub description: Option<String>,
    pub occurred_on: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LedgerEntry for Transaction {
    fn kind(&self) -> TransactionKind {
        self.kind
    }

    fn amount(&self) -> Decimal {
        self.amount
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn occurred_on(&self) -> NaiveDate {
        self.occurred_on
    }
}

#[derive(Debug, Clone)]
pub struct TransactionInput {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub category: String,
    pub description: Option<String>,
    pub occurred_on: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub month: Option<MonthKey>,
    pub category: Option<String>,
    pub kind: Option<TransactionKind>,
}

/// Monthly spending limit for one category
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Budget {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub category: String,
    /// First day of the budgeted month
    pub month: NaiveDate,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BudgetInput {
    pub category: String,
    pub month: MonthKey,
    pub amount: Decimal,
}

pub struct TransactionRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> TransactionRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List transactions, newest first.
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: &TransactionFilter,
        page: Pagination,
    ) -> Result<Paginated<Transaction>, DbError> {
        let (from, to) = match filter.month {
            Some(m) => (Some(m.first_day()), Some(m.last_day())),
            None => (None, None),
        };

        let rows = sqlx::query(
            r#"
            SELECT *, COUNT(*) OVER() AS total
            FROM transactions
            WHERE user_id = $1
              AND ($2::date IS NULL OR occurred_on >= $2)
              AND ($3::date IS NULL OR occurred_on <= $3)
              AND ($4::text IS NULL OR category = $4)
              AND ($5::text IS NULL OR kind = $5)
            ORDER BY occurred_on DESC, created_at DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .bind(&filter.category)
        .bind(filter.kind)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        paginate(rows, page)
    }

    /// Every transaction dated within `[from, to]`, unpaginated. Used for
    /// summaries, where all rows of the range contribute.
    pub async fn between(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Transaction>, DbError> {
        let rows = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE user_id = $1 AND occurred_on BETWEEN $2 AND $3
            ORDER BY occurred_on
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn in_month(&self, user_id: Uuid, month: MonthKey) -> Result<Vec<Transaction>, DbError> {
        self.between(user_id, month.first_day(), month.last_day()).await
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Transaction, DbError> {
        sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("transaction", id))
    }

    pub async fn create(&self, user_id: Uuid, input: TransactionInput) -> Result<Transaction, DbError> {
        let txn = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (user_id, kind, amount, category, description, occurred_on)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(input.kind)
        .bind(input.amount)
        .bind(&input.category)
        .bind(&input.description)
        .bind(input.occurred_on)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(transaction_id = %txn.id, kind = %txn.kind, "transaction recorded");
        Ok(txn)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: TransactionInput,
    ) -> Result<Transaction, DbError> {
        sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions SET
                kind = $3, amount = $4, category = $5, description = $6,
                occurred_on = $7, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(input.kind)
        .bind(input.amount)
        .bind(&input.category)
        .bind(&input.description)
        .bind(input.occurred_on)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("transaction", id))
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), DbError> {
        delete_owned(self.pool, "transactions", "transaction", user_id, id).await
    }

    // ---- budgets ----

    pub async fn list_budgets(
        &self,
        user_id: Uuid,
        month: Option<MonthKey>,
    ) -> Result<Vec<Budget>, DbError> {
        let rows = sqlx::query_as::<_, Budget>(
            r#"
            SELECT * FROM budgets
            WHERE user_id = $1 AND ($2::date IS NULL OR month = $2)
            ORDER BY month DESC, category
            "#,
        )
        .bind(user_id)
        .bind(month.map(|m| m.first_day()))
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_budget(&self, user_id: Uuid, id: Uuid) -> Result<Budget, DbError> {
        sqlx::query_as::<_, Budget>("SELECT * FROM budgets WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("budget", id))
    }

    /// A second budget for the same category and month is a `Conflict`.
    pub async fn create_budget(&self, user_id: Uuid, input: BudgetInput) -> Result<Budget, DbError> {
        let budget = sqlx::query_as::<_, Budget>(
            r#"
            INSERT INTO budgets (user_id, category, month, amount)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&input.category)
        .bind(input.month.first_day())
        .bind(input.amount)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(budget_id = %budget.id, month = %input.month, "budget created");
        Ok(budget)
    }

    pub async fn update_budget(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: BudgetInput,
    ) -> Result<Budget, DbError> {
        sqlx::query_as::<_, Budget>(
            r#"
            UPDATE budgets SET category = $3, month = $4, amount = $5, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.category)
        .bind(input.month.first_day())
        .bind(input.amount)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("budget", id))
    }

    pub async fn delete_budget(&self, user_id: Uuid, id: Uuid) -> Result<(), DbError> {
        delete_owned(self.pool, "budgets", "budget", user_id, id).await
    }
}

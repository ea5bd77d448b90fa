//! Investment holdings repository

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracker_core::finance::Valuation;
use tracker_core::InvestmentKind;
use uuid::Uuid;

use super::{delete_owned, paginate, DbError};
use crate::models::{Paginated, Pagination};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Investment {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub name: String,
    pub symbol: Option<String>,
    pub kind: InvestmentKind,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
    pub current_price: Decimal,
    pub purchased_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Investment {
    pub fn valuation(&self) -> Valuation {
        Valuation::of(self.quantity, self.purchase_price, self.current_price)
    }
}

#[derive(Debug, Clone)]
pub struct InvestmentInput {
    pub name: String,
    pub symbol: Option<String>,
    pub kind: InvestmentKind,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
    pub current_price: Decimal,
    pub purchased_on: Option<NaiveDate>,
}

pub struct InvestmentRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> InvestmentRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, user_id: Uuid, page: Pagination) -> Result<Paginated<Investment>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT *, COUNT(*) OVER() AS total
            FROM investments
            WHERE user_id = $1
            ORDER BY name, created_at
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

    /// Every holding, for portfolio totals.
    pub async fn all(&self, user_id: Uuid) -> Result<Vec<Investment>, DbError> {
        let rows = sqlx::query_as::<_, Investment>(
            "SELECT * FROM investments WHERE user_id = $1 ORDER BY name, created_at",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Investment, DbError> {
        sqlx::query_as::<_, Investment>("SELECT * FROM investments WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("investment", id))
    }

    pub async fn create(&self, user_id: Uuid, input: InvestmentInput) -> Result<Investment, DbError> {
        let inv = sqlx::query_as::<_, Investment>(
            r#"
            INSERT INTO investments
                (user_id, name, symbol, kind, quantity, purchase_price, current_price, purchased_on)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.symbol)
        .bind(input.kind)
        .bind(input.quantity)
        .bind(input.purchase_price)
        .bind(input.current_price)
        .bind(input.purchased_on)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(investment_id = %inv.id, "investment created");
        Ok(inv)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: InvestmentInput,
    ) -> Result<Investment, DbError> {
        sqlx::query_as::<_, Investment>(
            r#"
            UPDATE investments SET
                name = $3, symbol = $4, kind = $5, quantity = $6,
                purchase_price = $7, current_price = $8, purchased_on = $9,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.symbol)
        .bind(input.kind)
        .bind(input.quantity)
        .bind(input.purchase_price)
        .bind(input.current_price)
        .bind(input.purchased_on)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("investment", id))
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), DbError> {
        delete_owned(self.pool, "investments", "investment", user_id, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn valuation_uses_row_prices() {
        let now = Utc::now();
        let inv = Investment {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Index fund".into(),
            symbol: Some("VTI".into()),
            kind: InvestmentKind::Etf,
            quantity: dec!(4),
            purchase_price: dec!(200),
            current_price: dec!(250),
            purchased_on: None,
            created_at: now,
            updated_at: now,
        };

        let v = inv.valuation();
        assert_eq!(v.cost_basis, dec!(800));
        assert_eq!(v.market_value, dec!(1000));
        assert_eq!(v.gain_percent, dec!(25));
    }
}

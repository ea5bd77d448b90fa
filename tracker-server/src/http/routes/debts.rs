//! Debt endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracker_core::DebtDirection;
use uuid::Uuid;

use crate::db::repos::{Debt, DebtInput, DebtRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, Json, Path, Query};
use crate::http::server::AppState;
use crate::models::fields::{non_negative, positive, required_text, MAX_TITLE_LEN, MONEY, RATE};
use crate::models::{Paginated, Pagination, PaginationParams, ValidationError};

#[derive(Debug, Deserialize)]
pub struct DebtRequest {
    pub name: String,
    #[serde(default)]
    pub direction: DebtDirection,
    pub total_amount: Decimal,
    pub remaining_amount: Option<Decimal>,
    pub interest_rate: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
}

impl DebtRequest {
    fn validate(self) -> Result<DebtInput, ValidationError> {
        let total_amount = positive("total_amount", self.total_amount, MONEY)?;
        let remaining_amount = self
            .remaining_amount
            .map(|r| non_negative("remaining_amount", r, MONEY))
            .transpose()?;
        if remaining_amount.is_some_and(|r| r > total_amount) {
            return Err(ValidationError::InvalidRange {
                field: "remaining_amount",
                reason: "cannot exceed total_amount",
            });
        }

        Ok(DebtInput {
            name: required_text("name", &self.name, MAX_TITLE_LEN)?,
            direction: self.direction,
            total_amount,
            remaining_amount,
            interest_rate: self
                .interest_rate
                .map(|r| non_negative("interest_rate", r, RATE))
                .transpose()?,
            due_date: self.due_date,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub amount: Decimal,
}

/// GET /api/debts
async fn list_debts(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<Debt>>, ApiError> {
    let page = DebtRepo::new(&state.pool)
        .list(user, Pagination::from(params))
        .await?;
    Ok(Json(page))
}

/// POST /api/debts
async fn create_debt(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<DebtRequest>,
) -> Result<(StatusCode, Json<Debt>), ApiError> {
    let input = req.validate()?;
    let debt = DebtRepo::new(&state.pool).create(user, input).await?;
    Ok((StatusCode::CREATED, Json(debt)))
}

/// GET /api/debts/{id}
async fn get_debt(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Debt>, ApiError> {
    Ok(Json(DebtRepo::new(&state.pool).get(user, id).await?))
}

/// PUT /api/debts/{id}
async fn update_debt(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<DebtRequest>,
) -> Result<Json<Debt>, ApiError> {
    let input = req.validate()?;
    Ok(Json(DebtRepo::new(&state.pool).update(user, id, input).await?))
}

/// POST /api/debts/{id}/payments - reduce the outstanding balance
async fn record_payment(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<Debt>, ApiError> {
    let amount = positive("amount", req.amount, MONEY)?;
    Ok(Json(
        DebtRepo::new(&state.pool).record_payment(user, id, amount).await?,
    ))
}

/// DELETE /api/debts/{id}
async fn delete_debt(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    DebtRepo::new(&state.pool).delete(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/debts", get(list_debts).post(create_debt))
        .route("/debts/{id}", get(get_debt).put(update_debt).delete(delete_debt))
        .route("/debts/{id}/payments", post(record_payment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_cannot_exceed_total() {
        let req: DebtRequest = serde_json::from_value(serde_json::json!({
            "name": "car loan",
            "total_amount": 1000,
            "remaining_amount": 1500
        }))
        .unwrap();
        assert!(matches!(
            req.validate(),
            Err(ValidationError::InvalidRange { field: "remaining_amount", .. })
        ));
    }

    #[test]
    fn direction_defaults_to_owed() {
        let req: DebtRequest = serde_json::from_value(serde_json::json!({
            "name": "card",
            "total_amount": "250.00"
        }))
        .unwrap();
        let input = req.validate().unwrap();
        assert_eq!(input.direction, DebtDirection::Owed);
        assert_eq!(input.remaining_amount, None);
    }
}

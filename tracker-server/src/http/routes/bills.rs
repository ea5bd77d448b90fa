//! Bill endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracker_core::Recurrence;
use uuid::Uuid;

use super::{today, window_days};
use crate::db::repos::{Bill, BillInput, BillRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, Json, Path, Query};
use crate::http::server::AppState;
use crate::models::fields::{optional_text, positive, required_text, MAX_TITLE_LEN, MONEY};
use crate::models::{Paginated, Pagination, PaginationParams, ValidationError};

#[derive(Debug, Deserialize)]
pub struct BillRequest {
    pub name: String,
    pub amount: Decimal,
    pub category: Option<String>,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub recurrence: Recurrence,
    pub is_paid: Option<bool>,
}

impl BillRequest {
    fn validate(self) -> Result<BillInput, ValidationError> {
        Ok(BillInput {
            name: required_text("name", &self.name, MAX_TITLE_LEN)?,
            amount: positive("amount", self.amount, MONEY)?,
            category: optional_text("category", self.category.as_deref(), MAX_TITLE_LEN)?,
            due_date: self.due_date,
            recurrence: self.recurrence,
            is_paid: self.is_paid,
        })
    }
}

/// Body of `POST /api/bills/{id}/pay`; defaults to today.
#[derive(Debug, Default, Deserialize)]
pub struct PayRequest {
    pub paid_on: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpcomingQuery {
    pub days: Option<u32>,
}

/// GET /api/bills
async fn list_bills(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<Bill>>, ApiError> {
    let page = BillRepo::new(&state.pool)
        .list(user, Pagination::from(params))
        .await?;
    Ok(Json(page))
}

/// GET /api/bills/upcoming?days=N - unpaid bills due within N days (default 30)
async fn upcoming_bills(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<Vec<Bill>>, ApiError> {
    let days = window_days(query.days, 30, 365);
    let until = today() + Duration::days(i64::from(days));
    Ok(Json(BillRepo::new(&state.pool).upcoming(user, until).await?))
}

/// POST /api/bills
async fn create_bill(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<BillRequest>,
) -> Result<(StatusCode, Json<Bill>), ApiError> {
    let input = req.validate()?;
    let bill = BillRepo::new(&state.pool).create(user, input).await?;
    Ok((StatusCode::CREATED, Json(bill)))
}

/// GET /api/bills/{id}
async fn get_bill(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Bill>, ApiError> {
    Ok(Json(BillRepo::new(&state.pool).get(user, id).await?))
}

/// PUT /api/bills/{id}
async fn update_bill(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<BillRequest>,
) -> Result<Json<Bill>, ApiError> {
    let input = req.validate()?;
    Ok(Json(BillRepo::new(&state.pool).update(user, id, input).await?))
}

/// POST /api/bills/{id}/pay
async fn pay_bill(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    body: Option<Json<PayRequest>>,
) -> Result<Json<Bill>, ApiError> {
    let paid_on = body.and_then(|Json(b)| b.paid_on).unwrap_or_else(today);
    Ok(Json(BillRepo::new(&state.pool).mark_paid(user, id, paid_on).await?))
}

/// DELETE /api/bills/{id}
async fn delete_bill(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    BillRepo::new(&state.pool).delete(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bills", get(list_bills).post(create_bill))
        .route("/bills/upcoming", get(upcoming_bills))
        .route("/bills/{id}", get(get_bill).put(update_bill).delete(delete_bill))
        .route("/bills/{id}/pay", post(pay_bill))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recurrence_defaults_to_monthly() {
        let req: BillRequest = serde_json::from_value(serde_json::json!({
            "name": "internet",
            "amount": "49.99",
            "due_date": "2024-07-15"
        }))
        .unwrap();
        let input = req.validate().unwrap();
        assert_eq!(input.recurrence, Recurrence::Monthly);
        assert_eq!(input.category, None);
    }

    #[test]
    fn negative_amount_rejected() {
        let req: BillRequest = serde_json::from_value(serde_json::json!({
            "name": "internet",
            "amount": -5,
            "due_date": "2024-07-15"
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn is_paid_optional_and_passed_through() {
        let req: BillRequest = serde_json::from_value(serde_json::json!({
            "name": "vet",
            "amount": "80",
            "due_date": "2024-07-15",
            "recurrence": "none",
            "is_paid": false
        }))
        .unwrap();
        assert_eq!(req.validate().unwrap().is_paid, Some(false));

        let req: BillRequest = serde_json::from_value(serde_json::json!({
            "name": "vet",
            "amount": "80",
            "due_date": "2024-07-15"
        }))
        .unwrap();
        assert_eq!(req.validate().unwrap().is_paid, None);
    }
}

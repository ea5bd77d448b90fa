//! Investment endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracker_core::finance::{PortfolioSummary, Valuation};
use tracker_core::InvestmentKind;
use uuid::Uuid;

use crate::db::repos::{Investment, InvestmentInput, InvestmentRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, Json, Path, Query};
use crate::http::server::AppState;
use crate::models::fields::{
    non_negative, optional_text, positive, required_text, MAX_TITLE_LEN, MONEY, QUANTITY,
};
use crate::models::{Paginated, Pagination, PaginationParams, ValidationError};

#[derive(Debug, Deserialize)]
pub struct InvestmentRequest {
    pub name: String,
    pub symbol: Option<String>,
    #[serde(default)]
    pub kind: InvestmentKind,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
    /// Defaults to the purchase price.
    pub current_price: Option<Decimal>,
    pub purchased_on: Option<NaiveDate>,
}

impl InvestmentRequest {
    fn validate(self) -> Result<InvestmentInput, ValidationError> {
        let purchase_price = non_negative("purchase_price", self.purchase_price, MONEY)?;
        Ok(InvestmentInput {
            name: required_text("name", &self.name, MAX_TITLE_LEN)?,
            symbol: optional_text("symbol", self.symbol.as_deref(), 20)?
                .map(|s| s.to_ascii_uppercase()),
            kind: self.kind,
            quantity: positive("quantity", self.quantity, QUANTITY)?,
            purchase_price,
            current_price: non_negative(
                "current_price",
                self.current_price.unwrap_or(purchase_price),
                MONEY,
            )?,
            purchased_on: self.purchased_on,
        })
    }
}

/// A holding with its computed valuation
#[derive(Debug, Serialize)]
pub struct InvestmentResponse {
    #[serde(flatten)]
    pub investment: Investment,
    #[serde(flatten)]
    pub valuation: Valuation,
}

impl From<Investment> for InvestmentResponse {
    fn from(investment: Investment) -> Self {
        let valuation = investment.valuation();
        Self {
            investment,
            valuation,
        }
    }
}

/// GET /api/investments
async fn list_investments(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<InvestmentResponse>>, ApiError> {
    let page = InvestmentRepo::new(&state.pool)
        .list(user, Pagination::from(params))
        .await?;
    Ok(Json(page.map(InvestmentResponse::from)))
}

/// GET /api/investments/summary - portfolio totals
async fn portfolio_summary(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<PortfolioSummary>, ApiError> {
    let holdings = InvestmentRepo::new(&state.pool).all(user).await?;
    let valuations: Vec<Valuation> = holdings.iter().map(Investment::valuation).collect();
    Ok(Json(PortfolioSummary::from_valuations(&valuations)))
}

/// POST /api/investments
async fn create_investment(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<InvestmentRequest>,
) -> Result<(StatusCode, Json<InvestmentResponse>), ApiError> {
    let input = req.validate()?;
    let inv = InvestmentRepo::new(&state.pool).create(user, input).await?;
    Ok((StatusCode::CREATED, Json(inv.into())))
}

/// GET /api/investments/{id}
async fn get_investment(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<InvestmentResponse>, ApiError> {
    let inv = InvestmentRepo::new(&state.pool).get(user, id).await?;
    Ok(Json(inv.into()))
}

/// PUT /api/investments/{id}
async fn update_investment(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<InvestmentRequest>,
) -> Result<Json<InvestmentResponse>, ApiError> {
    let input = req.validate()?;
    let inv = InvestmentRepo::new(&state.pool).update(user, id, input).await?;
    Ok(Json(inv.into()))
}

/// DELETE /api/investments/{id}
async fn delete_investment(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    InvestmentRepo::new(&state.pool).delete(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/investments", get(list_investments).post(create_investment))
        .route("/investments/summary", get(portfolio_summary))
        .route(
            "/investments/{id}",
            get(get_investment).put(update_investment).delete(delete_investment),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn current_price_defaults_to_purchase_price() {
        let req: InvestmentRequest = serde_json::from_value(serde_json::json!({
            "name": "Bitcoin",
            "symbol": "btc",
            "kind": "crypto",
            "quantity": "0.5",
            "purchase_price": "30000"
        }))
        .unwrap();
        let input = req.validate().unwrap();
        assert_eq!(input.current_price, dec!(30000));
        assert_eq!(input.symbol.as_deref(), Some("BTC"));
    }

    #[test]
    fn zero_quantity_rejected() {
        let req: InvestmentRequest = serde_json::from_value(serde_json::json!({
            "name": "Bond",
            "quantity": 0,
            "purchase_price": 100
        }))
        .unwrap();
        assert_eq!(
            req.validate().unwrap_err(),
            ValidationError::NotPositive { field: "quantity" }
        );
    }
}

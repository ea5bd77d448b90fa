//! Shopping list endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repos::{ShoppingInput, ShoppingItem, ShoppingRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, Json, Path, Query};
use crate::http::server::AppState;
use crate::models::fields::{non_negative, optional_text, required_text, MAX_TITLE_LEN, MONEY};
use crate::models::{Paginated, Pagination, PaginationParams, ValidationError};

#[derive(Debug, Deserialize)]
pub struct ShoppingRequest {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub category: Option<String>,
    pub estimated_price: Option<Decimal>,
    #[serde(default)]
    pub is_purchased: bool,
}

fn default_quantity() -> i32 {
    1
}

impl ShoppingRequest {
    fn validate(self) -> Result<ShoppingInput, ValidationError> {
        if self.quantity <= 0 {
            return Err(ValidationError::NotPositive { field: "quantity" });
        }
        Ok(ShoppingInput {
            name: required_text("name", &self.name, MAX_TITLE_LEN)?,
            quantity: self.quantity,
            category: optional_text("category", self.category.as_deref(), MAX_TITLE_LEN)?,
            estimated_price: self
                .estimated_price
                .map(|p| non_negative("estimated_price", p, MONEY))
                .transpose()?,
            is_purchased: self.is_purchased,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ClearedResponse {
    pub removed: u64,
}

/// GET /api/shopping
async fn list_items(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<ShoppingItem>>, ApiError> {
    let page = ShoppingRepo::new(&state.pool)
        .list(user, Pagination::from(params))
        .await?;
    Ok(Json(page))
}

/// POST /api/shopping
async fn create_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<ShoppingRequest>,
) -> Result<(StatusCode, Json<ShoppingItem>), ApiError> {
    let input = req.validate()?;
    let item = ShoppingRepo::new(&state.pool).create(user, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /api/shopping/{id}
async fn get_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ShoppingItem>, ApiError> {
    Ok(Json(ShoppingRepo::new(&state.pool).get(user, id).await?))
}

/// PUT /api/shopping/{id}
async fn update_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ShoppingRequest>,
) -> Result<Json<ShoppingItem>, ApiError> {
    let input = req.validate()?;
    Ok(Json(ShoppingRepo::new(&state.pool).update(user, id, input).await?))
}

/// POST /api/shopping/{id}/toggle
async fn toggle_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ShoppingItem>, ApiError> {
    Ok(Json(ShoppingRepo::new(&state.pool).toggle(user, id).await?))
}

/// DELETE /api/shopping/purchased - clear everything already bought
async fn clear_purchased(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ClearedResponse>, ApiError> {
    let removed = ShoppingRepo::new(&state.pool).clear_purchased(user).await?;
    Ok(Json(ClearedResponse { removed }))
}

/// DELETE /api/shopping/{id}
async fn delete_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ShoppingRepo::new(&state.pool).delete(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shopping", get(list_items).post(create_item))
        .route("/shopping/purchased", delete(clear_purchased))
        .route("/shopping/{id}", get(get_item).put(update_item).delete(delete_item))
        .route("/shopping/{id}/toggle", post(toggle_item))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_defaults_to_one() {
        let req: ShoppingRequest =
            serde_json::from_value(serde_json::json!({ "name": "eggs" })).unwrap();
        let input = req.validate().unwrap();
        assert_eq!(input.quantity, 1);
        assert!(!input.is_purchased);
    }

    #[test]
    fn zero_quantity_rejected() {
        let req: ShoppingRequest =
            serde_json::from_value(serde_json::json!({ "name": "eggs", "quantity": 0 })).unwrap();
        assert_eq!(
            req.validate().unwrap_err(),
            ValidationError::NotPositive { field: "quantity" }
        );
    }
}

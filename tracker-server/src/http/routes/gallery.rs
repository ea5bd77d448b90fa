//! Gallery endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::repos::{GalleryInput, GalleryItem, GalleryRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, Json, Path, Query};
use crate::http::server::AppState;
use crate::models::fields::{optional_text, optional_url, required_text, MAX_TEXT_LEN, MAX_TITLE_LEN};
use crate::models::{Paginated, Pagination, PaginationParams, ValidationError};

#[derive(Debug, Deserialize)]
pub struct GalleryRequest {
    pub title: String,
    pub image_url: String,
    pub description: Option<String>,
    pub taken_on: Option<NaiveDate>,
}

impl GalleryRequest {
    fn validate(self) -> Result<GalleryInput, ValidationError> {
        let image_url = optional_url("image_url", Some(&self.image_url))?
            .ok_or(ValidationError::Empty { field: "image_url" })?;
        Ok(GalleryInput {
            title: required_text("title", &self.title, MAX_TITLE_LEN)?,
            image_url,
            description: optional_text("description", self.description.as_deref(), MAX_TEXT_LEN)?,
            taken_on: self.taken_on,
        })
    }
}

/// GET /api/gallery
async fn list_items(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<GalleryItem>>, ApiError> {
    let page = GalleryRepo::new(&state.pool)
        .list(user, Pagination::from(params))
        .await?;
    Ok(Json(page))
}

/// POST /api/gallery
async fn create_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<GalleryRequest>,
) -> Result<(StatusCode, Json<GalleryItem>), ApiError> {
    let input = req.validate()?;
    let item = GalleryRepo::new(&state.pool).create(user, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /api/gallery/{id}
async fn get_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<GalleryItem>, ApiError> {
    Ok(Json(GalleryRepo::new(&state.pool).get(user, id).await?))
}

/// PUT /api/gallery/{id}
async fn update_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<GalleryRequest>,
) -> Result<Json<GalleryItem>, ApiError> {
    let input = req.validate()?;
    Ok(Json(GalleryRepo::new(&state.pool).update(user, id, input).await?))
}

/// DELETE /api/gallery/{id}
async fn delete_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    GalleryRepo::new(&state.pool).delete(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/gallery", get(list_items).post(create_item))
        .route("/gallery/{id}", get(get_item).put(update_item).delete(delete_item))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> GalleryRequest {
        GalleryRequest {
            title: "Beach".into(),
            image_url: url.into(),
            description: None,
            taken_on: None,
        }
    }

    #[test]
    fn image_url_required() {
        assert_eq!(
            request("  ").validate().unwrap_err(),
            ValidationError::Empty { field: "image_url" }
        );
    }

    #[test]
    fn image_url_must_be_http() {
        assert!(request("file:///tmp/a.png").validate().is_err());
        assert!(request("https://img.example.com/a.png").validate().is_ok());
    }
}

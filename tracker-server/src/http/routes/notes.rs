//! Journal note endpoints

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

use crate::db::repos::{Note, NoteInput, NoteRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, Json, Path, Query};
use crate::http::server::AppState;
use crate::models::fields::{optional_text, required_text, MAX_BODY_LEN, MAX_TITLE_LEN};
use crate::models::{Paginated, Pagination, PaginationParams, ValidationError};

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub title: String,
    pub content: String,
    pub mood: Option<String>,
    pub entry_date: Option<NaiveDate>,
}

impl NoteRequest {
    fn validate(self) -> Result<NoteInput, ValidationError> {
        Ok(NoteInput {
            title: required_text("title", &self.title, MAX_TITLE_LEN)?,
            content: required_text("content", &self.content, MAX_BODY_LEN)?,
            mood: optional_text("mood", self.mood.as_deref(), 50)?,
            entry_date: self.entry_date,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NoteQuery {
    pub q: Option<String>,
}

/// GET /api/notes?q=
async fn list_notes(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PaginationParams>,
    Query(query): Query<NoteQuery>,
) -> Result<Json<Paginated<Note>>, ApiError> {
    let q = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let page = NoteRepo::new(&state.pool)
        .list(user, q, Pagination::from(params))
        .await?;
    Ok(Json(page))
}

/// POST /api/notes
async fn create_note(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<NoteRequest>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let input = req.validate()?;
    let note = NoteRepo::new(&state.pool).create(user, input).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// GET /api/notes/{id}
async fn get_note(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Note>, ApiError> {
    Ok(Json(NoteRepo::new(&state.pool).get(user, id).await?))
}

/// PUT /api/notes/{id}
async fn update_note(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<NoteRequest>,
) -> Result<Json<Note>, ApiError> {
    let input = req.validate()?;
    Ok(Json(NoteRepo::new(&state.pool).update(user, id, input).await?))
}

/// DELETE /api/notes/{id}
async fn delete_note(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    NoteRepo::new(&state.pool).delete(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/notes", get(list_notes).post(create_note))
        .route("/notes/{id}", get(get_note).put(update_note).delete(delete_note))
}

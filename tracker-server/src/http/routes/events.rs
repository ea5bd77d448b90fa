//! Calendar event endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::repos::{Event, EventInput, EventRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, Json, Path, Query};
use crate::http::server::AppState;
use crate::models::fields::{optional_text, required_text, MAX_TEXT_LEN, MAX_TITLE_LEN};
use crate::models::{Paginated, Pagination, PaginationParams, ValidationError};

#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub all_day: bool,
}

impl EventRequest {
    fn validate(self) -> Result<EventInput, ValidationError> {
        if self.ends_at.is_some_and(|end| end < self.starts_at) {
            return Err(ValidationError::InvalidRange {
                field: "ends_at",
                reason: "must not be before starts_at",
            });
        }
        Ok(EventInput {
            title: required_text("title", &self.title, MAX_TITLE_LEN)?,
            description: optional_text("description", self.description.as_deref(), MAX_TEXT_LEN)?,
            location: optional_text("location", self.location.as_deref(), MAX_TITLE_LEN)?,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            all_day: self.all_day,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EventRangeQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// GET /api/events?from=&to= (RFC 3339 timestamps)
async fn list_events(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PaginationParams>,
    Query(range): Query<EventRangeQuery>,
) -> Result<Json<Paginated<Event>>, ApiError> {
    if let (Some(from), Some(to)) = (range.from, range.to) {
        if from > to {
            return Err(ValidationError::InvalidRange {
                field: "from",
                reason: "must not be after 'to'",
            }
            .into());
        }
    }
    let page = EventRepo::new(&state.pool)
        .list(user, range.from, range.to, Pagination::from(params))
        .await?;
    Ok(Json(page))
}

/// POST /api/events
async fn create_event(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<EventRequest>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let input = req.validate()?;
    let event = EventRepo::new(&state.pool).create(user, input).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /api/events/{id}
async fn get_event(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Event>, ApiError> {
    Ok(Json(EventRepo::new(&state.pool).get(user, id).await?))
}

/// PUT /api/events/{id}
async fn update_event(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<EventRequest>,
) -> Result<Json<Event>, ApiError> {
    let input = req.validate()?;
    Ok(Json(EventRepo::new(&state.pool).update(user, id, input).await?))
}

/// DELETE /api/events/{id}
async fn delete_event(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    EventRepo::new(&state.pool).delete(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/{id}", get(get_event).put(update_event).delete(delete_event))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_before_start_rejected() {
        let req: EventRequest = serde_json::from_value(serde_json::json!({
            "title": "Dentist",
            "starts_at": "2024-04-02T10:00:00Z",
            "ends_at": "2024-04-02T09:00:00Z"
        }))
        .unwrap();
        assert!(matches!(
            req.validate(),
            Err(ValidationError::InvalidRange { field: "ends_at", .. })
        ));
    }

    #[test]
    fn open_ended_event_ok() {
        let req: EventRequest = serde_json::from_value(serde_json::json!({
            "title": "Conference",
            "starts_at": "2024-04-02T10:00:00Z",
            "all_day": true
        }))
        .unwrap();
        let input = req.validate().unwrap();
        assert!(input.all_day);
        assert!(input.ends_at.is_none());
    }
}

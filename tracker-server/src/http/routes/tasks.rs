//! Task endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracker_core::{Priority, TaskStatus};
use uuid::Uuid;

use crate::db::repos::{Task, TaskFilter, TaskInput, TaskRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, Json, Path, Query};
use crate::http::server::AppState;
use crate::models::fields::{optional_text, required_text, MAX_TEXT_LEN, MAX_TITLE_LEN};
use crate::models::{Paginated, Pagination, PaginationParams, ValidationError};

/// Create/replace task request
#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
}

impl TaskRequest {
    fn validate(self) -> Result<TaskInput, ValidationError> {
        Ok(TaskInput {
            title: required_text("title", &self.title, MAX_TITLE_LEN)?,
            description: optional_text("description", self.description.as_deref(), MAX_TEXT_LEN)?,
            priority: self.priority,
            status: self.status,
            due_date: self.due_date,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
}

/// GET /api/tasks
async fn list_tasks(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PaginationParams>,
    Query(query): Query<TaskQuery>,
) -> Result<Json<Paginated<Task>>, ApiError> {
    let filter = TaskFilter {
        status: query.status,
        priority: query.priority,
    };
    let page = TaskRepo::new(&state.pool)
        .list(user, &filter, Pagination::from(params))
        .await?;
    Ok(Json(page))
}

/// POST /api/tasks
async fn create_task(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<TaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let input = req.validate()?;
    let task = TaskRepo::new(&state.pool).create(user, input).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/tasks/{id}
async fn get_task(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(TaskRepo::new(&state.pool).get(user, id).await?))
}

/// PUT /api/tasks/{id}
async fn update_task(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<TaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let input = req.validate()?;
    Ok(Json(TaskRepo::new(&state.pool).update(user, id, input).await?))
}

/// POST /api/tasks/{id}/toggle - flip between done and todo
async fn toggle_task(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(TaskRepo::new(&state.pool).toggle(user, id).await?))
}

/// DELETE /api/tasks/{id}
async fn delete_task(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    TaskRepo::new(&state.pool).delete(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{id}", get(get_task).put(update_task).delete(delete_task))
        .route("/tasks/{id}/toggle", post(toggle_task))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str) -> TaskRequest {
        serde_json::from_value(serde_json::json!({ "title": title })).unwrap()
    }

    #[test]
    fn defaults_apply() {
        let input = request("  Buy milk ").validate().unwrap();
        assert_eq!(input.title, "Buy milk");
        assert_eq!(input.priority, Priority::Medium);
        assert_eq!(input.status, TaskStatus::Todo);
    }

    #[test]
    fn blank_title_rejected() {
        assert_eq!(
            request("   ").validate().unwrap_err(),
            ValidationError::Empty { field: "title" }
        );
    }

    #[test]
    fn unknown_status_fails_to_parse() {
        let parsed: Result<TaskRequest, _> =
            serde_json::from_value(serde_json::json!({ "title": "x", "status": "blocked" }));
        assert!(parsed.is_err());
    }
}

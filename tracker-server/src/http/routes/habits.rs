//! Habit endpoints: CRUD, daily logs and streak statistics

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracker_core::HabitStats;
use uuid::Uuid;

use super::today;
use crate::db::repos::{Habit, HabitInput, HabitLog, HabitRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, Json, Path, Query};
use crate::http::server::AppState;
use crate::models::fields::{optional_text, required_text, MAX_TEXT_LEN, MAX_TITLE_LEN};
use crate::models::{HexColor, Paginated, Pagination, PaginationParams, ValidationError};

#[derive(Debug, Deserialize)]
pub struct HabitRequest {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

impl HabitRequest {
    fn validate(self) -> Result<HabitInput, ValidationError> {
        let color = match self.color.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(c) => Some(HexColor::new(c)?.into_string()),
        };
        Ok(HabitInput {
            name: required_text("name", &self.name, MAX_TITLE_LEN)?,
            description: optional_text("description", self.description.as_deref(), MAX_TEXT_LEN)?,
            color,
            archived: self.archived,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HabitQuery {
    #[serde(default)]
    pub include_archived: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogRangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Upsert body; `date` defaults to today and `completed` to true.
#[derive(Debug, Deserialize)]
pub struct LogRequest {
    pub date: Option<NaiveDate>,
    #[serde(default = "completed_default")]
    pub completed: bool,
}

fn completed_default() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct HabitStatsResponse {
    pub habit_id: Uuid,
    pub name: String,
    pub color: Option<String>,
    #[serde(flatten)]
    pub stats: HabitStats,
}

impl HabitStatsResponse {
    fn new(habit: Habit, completed: &[NaiveDate], today: NaiveDate) -> Self {
        Self {
            habit_id: habit.id,
            name: habit.name,
            color: habit.color,
            stats: HabitStats::compute(completed, today),
        }
    }
}

/// GET /api/habits
async fn list_habits(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PaginationParams>,
    Query(query): Query<HabitQuery>,
) -> Result<Json<Paginated<Habit>>, ApiError> {
    let page = HabitRepo::new(&state.pool)
        .list(user, query.include_archived, Pagination::from(params))
        .await?;
    Ok(Json(page))
}

/// POST /api/habits
async fn create_habit(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<HabitRequest>,
) -> Result<(StatusCode, Json<Habit>), ApiError> {
    let input = req.validate()?;
    let habit = HabitRepo::new(&state.pool).create(user, input).await?;
    Ok((StatusCode::CREATED, Json(habit)))
}

/// GET /api/habits/{id}
async fn get_habit(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Habit>, ApiError> {
    Ok(Json(HabitRepo::new(&state.pool).get(user, id).await?))
}

/// PUT /api/habits/{id}
async fn update_habit(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<HabitRequest>,
) -> Result<Json<Habit>, ApiError> {
    let input = req.validate()?;
    Ok(Json(HabitRepo::new(&state.pool).update(user, id, input).await?))
}

/// DELETE /api/habits/{id}
async fn delete_habit(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    HabitRepo::new(&state.pool).delete(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/habits/{id}/logs?from=&to=
async fn list_logs(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Query(range): Query<LogRangeQuery>,
) -> Result<Json<Vec<HabitLog>>, ApiError> {
    if let (Some(from), Some(to)) = (range.from, range.to) {
        if from > to {
            return Err(ValidationError::InvalidRange {
                field: "from",
                reason: "must not be after 'to'",
            }
            .into());
        }
    }
    let logs = HabitRepo::new(&state.pool)
        .logs(user, id, range.from, range.to)
        .await?;
    Ok(Json(logs))
}

/// POST /api/habits/{id}/logs - create or overwrite the log for a day
async fn upsert_log(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<LogRequest>,
) -> Result<Json<HabitLog>, ApiError> {
    let date = req.date.unwrap_or_else(today);
    let log = HabitRepo::new(&state.pool)
        .upsert_log(user, id, date, req.completed)
        .await?;
    Ok(Json(log))
}

/// DELETE /api/habits/{id}/logs/{date}
async fn delete_log(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path((id, date)): Path<(Uuid, NaiveDate)>,
) -> Result<StatusCode, ApiError> {
    HabitRepo::new(&state.pool).delete_log(user, id, date).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/habits/{id}/stats
async fn habit_stats(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<HabitStatsResponse>, ApiError> {
    let repo = HabitRepo::new(&state.pool);
    let habit = repo.get(user, id).await?;
    let completed = repo.completed_dates(user, id).await?;
    Ok(Json(HabitStatsResponse::new(habit, &completed, today())))
}

/// GET /api/habits/stats - statistics for every active habit
async fn all_stats(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<HabitStatsResponse>>, ApiError> {
    let repo = HabitRepo::new(&state.pool);
    let habits = repo.active(user).await?;
    let mut dates = repo.completed_dates_by_habit(user).await?;
    let today = today();

    let stats = habits
        .into_iter()
        .map(|h| {
            let completed = dates.remove(&h.id).unwrap_or_default();
            HabitStatsResponse::new(h, &completed, today)
        })
        .collect();
    Ok(Json(stats))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/habits", get(list_habits).post(create_habit))
        .route("/habits/stats", get(all_stats))
        .route("/habits/{id}", get(get_habit).put(update_habit).delete(delete_habit))
        .route("/habits/{id}/logs", get(list_logs).post(upsert_log))
        .route("/habits/{id}/logs/{date}", delete(delete_log))
        .route("/habits/{id}/stats", get(habit_stats))
}

//! Study endpoints: coding problems and system design cases with
//! spaced-repetition review.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use tracker_core::{Difficulty, ReviewOutcome};
use uuid::Uuid;

use crate::db::repos::{DesignCase, DesignCaseInput, Problem, ProblemInput, StudyRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, Json, Path, Query};
use crate::http::server::AppState;
use crate::models::fields::{optional_text, optional_url, required_text, MAX_TEXT_LEN, MAX_TITLE_LEN};
use crate::models::{Paginated, Pagination, PaginationParams, ValidationError};

#[derive(Debug, Deserialize)]
pub struct ProblemRequest {
    pub title: String,
    pub url: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub topic: Option<String>,
    pub notes: Option<String>,
}

impl ProblemRequest {
    fn validate(self) -> Result<ProblemInput, ValidationError> {
        Ok(ProblemInput {
            title: required_text("title", &self.title, MAX_TITLE_LEN)?,
            url: optional_url("url", self.url.as_deref())?,
            difficulty: self.difficulty,
            topic: optional_text("topic", self.topic.as_deref(), MAX_TITLE_LEN)?,
            notes: optional_text("notes", self.notes.as_deref(), MAX_TEXT_LEN)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct DesignCaseRequest {
    pub title: String,
    pub prompt: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub notes: Option<String>,
}

impl DesignCaseRequest {
    fn validate(self) -> Result<DesignCaseInput, ValidationError> {
        Ok(DesignCaseInput {
            title: required_text("title", &self.title, MAX_TITLE_LEN)?,
            prompt: optional_text("prompt", self.prompt.as_deref(), MAX_TEXT_LEN)?,
            difficulty: self.difficulty,
            notes: optional_text("notes", self.notes.as_deref(), MAX_TEXT_LEN)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub outcome: ReviewOutcome,
}

// ---- problems ----

async fn list_problems(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<Problem>>, ApiError> {
    let page = StudyRepo::new(&state.pool)
        .list_problems(user, Pagination::from(params))
        .await?;
    Ok(Json(page))
}

/// GET /api/study/problems/due
async fn due_problems(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Problem>>, ApiError> {
    Ok(Json(StudyRepo::new(&state.pool).due_problems(user, Utc::now()).await?))
}

async fn create_problem(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<ProblemRequest>,
) -> Result<(StatusCode, Json<Problem>), ApiError> {
    let input = req.validate()?;
    let problem = StudyRepo::new(&state.pool).create_problem(user, input).await?;
    Ok((StatusCode::CREATED, Json(problem)))
}

async fn get_problem(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Problem>, ApiError> {
    Ok(Json(StudyRepo::new(&state.pool).get_problem(user, id).await?))
}

async fn update_problem(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ProblemRequest>,
) -> Result<Json<Problem>, ApiError> {
    let input = req.validate()?;
    Ok(Json(StudyRepo::new(&state.pool).update_problem(user, id, input).await?))
}

/// POST /api/study/problems/{id}/review
async fn review_problem(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<Problem>, ApiError> {
    let problem = StudyRepo::new(&state.pool)
        .review_problem(user, id, req.outcome, Utc::now())
        .await?;
    Ok(Json(problem))
}

async fn delete_problem(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    StudyRepo::new(&state.pool).delete_problem(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- system design ----

async fn list_design_cases(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<DesignCase>>, ApiError> {
    let page = StudyRepo::new(&state.pool)
        .list_design_cases(user, Pagination::from(params))
        .await?;
    Ok(Json(page))
}

/// GET /api/study/system-design/due
async fn due_design_cases(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<DesignCase>>, ApiError> {
    Ok(Json(
        StudyRepo::new(&state.pool).due_design_cases(user, Utc::now()).await?,
    ))
}

async fn create_design_case(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<DesignCaseRequest>,
) -> Result<(StatusCode, Json<DesignCase>), ApiError> {
    let input = req.validate()?;
    let case = StudyRepo::new(&state.pool).create_design_case(user, input).await?;
    Ok((StatusCode::CREATED, Json(case)))
}

async fn get_design_case(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DesignCase>, ApiError> {
    Ok(Json(StudyRepo::new(&state.pool).get_design_case(user, id).await?))
}

async fn update_design_case(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<DesignCaseRequest>,
) -> Result<Json<DesignCase>, ApiError> {
    let input = req.validate()?;
    Ok(Json(
        StudyRepo::new(&state.pool).update_design_case(user, id, input).await?,
    ))
}

/// POST /api/study/system-design/{id}/review
async fn review_design_case(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<DesignCase>, ApiError> {
    let case = StudyRepo::new(&state.pool)
        .review_design_case(user, id, req.outcome, Utc::now())
        .await?;
    Ok(Json(case))
}

async fn delete_design_case(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    StudyRepo::new(&state.pool).delete_design_case(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/study/problems", get(list_problems).post(create_problem))
        .route("/study/problems/due", get(due_problems))
        .route(
            "/study/problems/{id}",
            get(get_problem).put(update_problem).delete(delete_problem),
        )
        .route("/study/problems/{id}/review", post(review_problem))
        .route(
            "/study/system-design",
            get(list_design_cases).post(create_design_case),
        )
        .route("/study/system-design/due", get(due_design_cases))
        .route(
            "/study/system-design/{id}",
            get(get_design_case)
                .put(update_design_case)
                .delete(delete_design_case),
        )
        .route("/study/system-design/{id}/review", post(review_design_case))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn problem_url_validated() {
        let req: ProblemRequest = serde_json::from_value(serde_json::json!({
            "title": "LRU Cache",
            "url": "leetcode.com/problems/lru-cache"
        }))
        .unwrap();
        assert!(matches!(
            req.validate(),
            Err(ValidationError::InvalidFormat { field: "url", .. })
        ));
    }

    #[test]
    fn review_outcome_parses() {
        let req: ReviewRequest =
            serde_json::from_value(serde_json::json!({ "outcome": "easy" })).unwrap();
        assert_eq!(req.outcome, ReviewOutcome::Easy);

        let bad: Result<ReviewRequest, _> =
            serde_json::from_value(serde_json::json!({ "outcome": "perfect" }));
        assert!(bad.is_err());
    }
}

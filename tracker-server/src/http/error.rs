//! API error type with IntoResponse
//!
//! Errors are converted to `{error, message}` JSON with a matching status.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracker_ai::AiError;

use crate::db::repos::DbError;
use crate::models::ValidationError;

#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Request is well-formed but violates a domain rule (400)
    BadRequest { message: String },

    /// Body, query or path could not be parsed (axum's status, usually 400/415/422)
    Rejected { status: StatusCode, message: String },

    /// Missing or malformed user identity (401)
    Unauthorized,

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Unique constraint hit (409)
    Conflict { constraint: String },

    /// Database error (500, logged)
    Database(DbError),

    /// Internal error (500, logged)
    Internal { message: String },

    /// Upstream AI provider failed (502)
    Upstream { message: String },

    /// Feature not configured or no capacity (503)
    Unavailable { message: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(e) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "validation_error", "message": e.to_string() }),
            ),
            Self::BadRequest { message } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "bad_request", "message": message }),
            ),
            Self::Rejected { status, message } => (
                *status,
                json!({ "error": "invalid_request", "message": message }),
            ),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({
                    "error": "unauthorized",
                    "message": "missing or invalid x-user-id header"
                }),
            ),
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": format!("{} '{}' not found", resource, id)
                }),
            ),
            Self::Conflict { constraint } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "conflict",
                    "message": conflict_message(constraint)
                }),
            ),
            Self::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal_error", "message": "an internal error occurred" }),
                )
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal_error", "message": "an internal error occurred" }),
                )
            }
            Self::Upstream { message } => {
                tracing::warn!("Upstream error: {}", message);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "error": "upstream_error", "message": message }),
                )
            }
            Self::Unavailable { message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "unavailable", "message": message }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Human-readable message for a named unique constraint.
fn conflict_message(constraint: &str) -> &'static str {
    match constraint {
        "budgets_user_category_month_key" => "a budget for this category and month already exists",
        "bills_user_name_key" => "a bill with this name already exists",
        "habits_user_name_key" => "a habit with this name already exists",
        "habit_logs_habit_date_key" => "this habit is already logged for that date",
        "problems_user_title_key" => "a problem with this title already exists",
        "system_design_cases_user_title_key" => "a system design case with this title already exists",
        _ => "resource already exists",
    }
}

fn rejected_message(constraint: &str) -> &'static str {
    match constraint {
        "debts_remaining_within_total" => "remaining_amount cannot exceed total_amount",
        "numeric range" => "a numeric value is too large",
        _ => "a value is out of the allowed range",
    }
}

macro_rules! from_rejection {
    ($($rejection:ty),+) => {
        $(
            impl From<$rejection> for ApiError {
                fn from(rejection: $rejection) -> Self {
                    Self::Rejected {
                        status: rejection.status(),
                        message: rejection.body_text(),
                    }
                }
            }
        )+
    };
}

from_rejection!(JsonRejection, QueryRejection, PathRejection);

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Conflict { constraint } => Self::Conflict { constraint },
            DbError::Domain(e) => Self::BadRequest {
                message: e.to_string(),
            },
            DbError::Rejected { constraint } => Self::BadRequest {
                message: rejected_message(&constraint).to_owned(),
            },
            DbError::Sqlx(_) => Self::Database(e),
        }
    }
}

impl From<AiError> for ApiError {
    fn from(e: AiError) -> Self {
        match e {
            AiError::EmptyPrompt => Self::Validation(ValidationError::Empty { field: "prompt" }),
            AiError::NotConfigured | AiError::NoAvailableKey => Self::Unavailable {
                message: e.to_string(),
            },
            AiError::Http(_) | AiError::Api { .. } | AiError::EmptyResponse => Self::Upstream {
                message: e.to_string(),
            },
        }
    }
}

//! AI text generation endpoint

use std::sync::Arc;

use axum::{extract::State, routing::post, Router};
use serde::{Deserialize, Serialize};
use tracker_ai::AiError;

use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, Json};
use crate::http::server::AppState;
use crate::models::fields::{required_text, MAX_BODY_LEN};

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub text: String,
    pub model: String,
}

/// POST /api/ai/generate - 503 when no API keys are configured
async fn generate(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let prompt = required_text("prompt", &req.prompt, MAX_BODY_LEN)?;
    let client = state.ai.as_ref().ok_or(AiError::NotConfigured)?;

    tracing::debug!(user_id = %user, prompt_chars = prompt.chars().count(), "ai generate");
    let text = client.generate(&prompt).await?;

    Ok(Json(GenerateResponse {
        text,
        model: client.model().to_owned(),
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/ai/generate", post(generate))
}

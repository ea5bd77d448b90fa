//! Gemini-style `generateContent` client with key failover.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracker_core::config::AiSection;

use crate::keys::KeyRing;

/// Longest error body kept in `AiError::Api`.
const MAX_ERROR_BODY: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("no API keys configured")]
    NotConfigured,

    #[error("all API keys are cooling down")]
    NoAvailableKey,

    #[error("prompt cannot be empty")]
    EmptyPrompt,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("API returned no text")]
    EmptyResponse,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Generative-AI client. Keys rotate round-robin; a key that hits a rate
/// limit, server error or transport failure is benched for the ring's
/// cooldown and the request moves on to the next key.
pub struct GenerativeClient {
    http: Client,
    base_url: String,
    model: String,
    keys: KeyRing,
}

impl GenerativeClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, keys: KeyRing) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            keys,
        }
    }

    /// Build from the `[ai]` config section; `None` when no keys are set.
    pub fn from_config(section: &AiSection) -> Option<Self> {
        if section.keys.is_empty() {
            return None;
        }
        let ring = KeyRing::new(section.keys.clone(), Duration::from_secs(section.cooldown_secs));
        Some(Self::new(&section.base_url, &section.model, ring))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn keys(&self) -> &KeyRing {
        &self.keys
    }

    /// Generate text for a prompt, failing over across keys.
    ///
    /// Each key is tried at most once per call.
    pub async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        if prompt.trim().is_empty() {
            return Err(AiError::EmptyPrompt);
        }
        if self.keys.is_empty() {
            return Err(AiError::NotConfigured);
        }

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
        };

        let mut last_error = None;
        for _ in 0..self.keys.len() {
            let Some(lease) = self.keys.next_key() else {
                break;
            };

            let response = match self
                .http
                .post(&url)
                .header("x-goog-api-key", &lease.key)
                .json(&body)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(key_index = lease.index, error = %e, "AI request failed, rotating key");
                    self.keys.mark_failed(&lease);
                    last_error = Some(AiError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                let data: GenerateResponse = response.json().await?;
                return data.into_text().ok_or(AiError::EmptyResponse);
            }

            let message = truncate(response.text().await.unwrap_or_default());
            let err = AiError::Api {
                status: status.as_u16(),
                message,
            };
            if is_retryable(status) {
                tracing::warn!(key_index = lease.index, %status, "AI key rejected, rotating");
                self.keys.mark_failed(&lease);
                last_error = Some(err);
                continue;
            }
            return Err(err);
        }

        Err(last_error.unwrap_or(AiError::NoAvailableKey))
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn truncate(mut text: String) -> String {
    if text.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push_str("...");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::DEFAULT_COOLDOWN;
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Stub API: "good" keys answer, "limited" keys get 429, "denied" get 403.
    async fn spawn_stub(hits: Arc<AtomicUsize>) -> String {
        let app = Router::new().route(
            "/models/{model}",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    let key = headers
                        .get("x-goog-api-key")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    let prompt = body["contents"][0]["parts"][0]["text"]
                        .as_str()
                        .unwrap_or_default()
                        .to_string();
                    match key.as_str() {
                        "limited" => (StatusCode::TOO_MANY_REQUESTS, Json(json!({"error": "quota"}))),
                        "denied" => (StatusCode::FORBIDDEN, Json(json!({"error": "bad key"}))),
                        _ => (
                            StatusCode::OK,
                            Json(json!({
                                "candidates": [{
                                    "content": {"role": "model", "parts": [{"text": format!("echo: {prompt}")}]}
                                }]
                            })),
                        ),
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base: &str, keys: &[&str]) -> GenerativeClient {
        let ring = KeyRing::new(keys.iter().map(|k| k.to_string()).collect(), DEFAULT_COOLDOWN);
        GenerativeClient::new(base, "test-model", ring)
    }

    #[tokio::test]
    async fn generates_text() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = spawn_stub(hits.clone()).await;
        let client = client(&base, &["good"]);

        let text = client.generate("hello").await.unwrap();
        assert_eq!(text, "echo: hello");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rate_limited_key_fails_over_and_cools_down() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = spawn_stub(hits.clone()).await;
        let client = client(&base, &["limited", "good"]);

        assert_eq!(client.generate("one").await.unwrap(), "echo: one");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(client.keys().available(), 1);

        // The limited key is benched, so the next call goes straight to "good".
        assert_eq!(client.generate("two").await.unwrap(), "echo: two");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn all_keys_limited_returns_last_error_then_no_key() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = spawn_stub(hits).await;
        let client = client(&base, &["limited", "limited"]);

        let err = client.generate("x").await.unwrap_err();
        assert!(matches!(err, AiError::Api { status: 429, .. }));

        let err = client.generate("x").await.unwrap_err();
        assert!(matches!(err, AiError::NoAvailableKey));
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = spawn_stub(hits.clone()).await;
        let client = client(&base, &["denied", "good"]);

        let err = client.generate("x").await.unwrap_err();
        assert!(matches!(err, AiError::Api { status: 403, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(client.keys().available(), 2);
    }

    #[tokio::test]
    async fn empty_prompt_and_missing_keys() {
        let client_without_keys = client("http://127.0.0.1:9", &[]);
        assert!(matches!(
            client_without_keys.generate("hi").await,
            Err(AiError::NotConfigured)
        ));
        assert!(matches!(
            client_without_keys.generate("   ").await,
            Err(AiError::EmptyPrompt)
        ));
    }

    #[test]
    fn from_config_requires_keys() {
        let mut section = AiSection::default();
        assert!(GenerativeClient::from_config(&section).is_none());

        section.keys = vec!["k".into()];
        let client = GenerativeClient::from_config(&section).unwrap();
        assert_eq!(client.keys().len(), 1);
        assert_eq!(client.keys().cooldown(), Duration::from_secs(60));
    }

    #[test]
    fn truncates_long_bodies() {
        let long = "x".repeat(800);
        let out = truncate(long);
        assert_eq!(out.len(), MAX_ERROR_BODY + 3);
    }
}

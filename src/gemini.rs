use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Upper bound on one generateContent round trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Canned user-facing strings. The timed-out string must stay distinct
/// from the network-failure one.
pub const REPLY_NO_ANSWER: &str = "Gemini gave no answer.";
pub const REPLY_REQUEST_FAILED: &str = "Gemini API request failed. Please try again later.";
pub const REPLY_TIMED_OUT: &str = "The request to Gemini took too long. Please try again.";
pub const REPLY_FAILURE: &str = "Something went wrong while processing your request.";

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    #[error("Gemini returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("malformed response: {0}")]
    Malformed(reqwest::Error),
}

/// Turns a text prompt into reply text. Implementations must be total:
/// every failure surfaces as a user-facing string, never as an error.
#[async_trait]
pub trait ReplyProvider: Send + Sync {
    async fn reply(&self, prompt: &str) -> String;
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Client for the Gemini generateContent endpoint. Auth via URL query param.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::with_base_url(GEMINI_BASE_URL.to_string(), api_key, model, REQUEST_TIMEOUT)
    }

    /// Also used by tests to point the client at a local mock server.
    pub fn with_base_url(
        base_url: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            api_key,
            model,
        })
    }

    /// One generateContent call. No retries; the caller decides what a
    /// failure means for the user.
    async fn generate(&self, prompt: &str) -> Result<String, GeminiError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        debug!("POST models/{}:generateContent", self.model);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeminiError::Timeout
                } else {
                    GeminiError::Transport(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::Status { status, body });
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GeminiError::Timeout
            } else if e.is_decode() {
                GeminiError::Malformed(e)
            } else {
                GeminiError::Transport(e)
            }
        })?;

        let text = parsed
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .map(|p| p.text.clone())
            .unwrap_or_else(|| REPLY_NO_ANSWER.to_string());

        Ok(text)
    }
}

#[async_trait]
impl ReplyProvider for GeminiClient {
    async fn reply(&self, prompt: &str) -> String {
        match self.generate(prompt).await {
            Ok(text) => text,
            Err(GeminiError::Timeout) => {
                error!("Gemini request timed out");
                REPLY_TIMED_OUT.to_string()
            }
            Err(e @ (GeminiError::Transport(_) | GeminiError::Status { .. })) => {
                error!("Gemini request failed: {}", e);
                REPLY_REQUEST_FAILED.to_string()
            }
            Err(e) => {
                error!("Unhandled Gemini failure: {}", e);
                REPLY_FAILURE.to_string()
            }
        }
    }
}

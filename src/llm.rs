// Client for the external OpenAI-compatible text-generation service.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;

/// Transport-level failures of the generation call. Distinct from
/// parser failures: these map to HTTP status codes at the handler
/// boundary instead of being masked by a fallback question.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation service rejected the API key")]
    Auth,
    #[error("generation service quota exceeded")]
    Quota,
    #[error("generation service returned status {0}")]
    Api(u16),
    #[error("failed to reach generation service: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("generation service returned no content")]
    EmptyResponse,
}

impl GenerationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GenerationError::Auth => StatusCode::UNAUTHORIZED,
            GenerationError::Quota => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable label for logging and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::Auth => "auth",
            GenerationError::Quota => "quota",
            GenerationError::Api(_) => "api",
            GenerationError::Transport(_) => "transport",
            GenerationError::EmptyResponse => "empty_response",
        }
    }
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageBody,
}

#[derive(Deserialize)]
struct ChatMessageBody {
    content: String,
}

/// Chat-completions client. The reply is treated as untrusted raw text;
/// recovering JSON from it is the parser's job, not the client's.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GenerationClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
            model,
        }
    }

    /// Build a client from config. `None` when no API key is set; the
    /// service then runs degraded, serving fallback questions only.
    pub fn from_config(config: &Config) -> Option<Self> {
        config.openai_api_key.as_ref().map(|key| {
            Self::new(
                key.clone(),
                config.openai_base_url.clone(),
                config.openai_model.clone(),
            )
        })
    }

    /// Send one system+user prompt pair and return the raw text reply.
    pub async fn generate(
        &self,
        system: &str,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt.to_string(),
                },
            ],
            temperature,
            max_tokens,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        match response.status().as_u16() {
            401 | 403 => return Err(GenerationError::Auth),
            429 => return Err(GenerationError::Quota),
            s if s >= 400 => return Err(GenerationError::Api(s)),
            _ => {}
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(content)
    }
}

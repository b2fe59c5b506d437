//! ClaudeGenerator - Direct REST implementation over the Anthropic Messages API.
//!
//! Credential priority: ~/.config/kambo/secret.json > `ANTHROPIC_API_KEY`.

use async_trait::async_trait;
use kambo_core::config::DEFAULT_CLAUDE_MODEL;
use kambo_core::generation::{GenerationError, TextGenerator};
use kambo_core::secret::SecretService;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::http_error::{map_http_error, map_transport_error};

const BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Secret name looked up in `secret.json`.
pub const CLAUDE_SECRET_NAME: &str = "claude";
/// Environment fallback for the API key.
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Generator that talks to the Claude HTTP API.
#[derive(Clone)]
pub struct ClaudeGenerator {
    client: Client,
    api_key: String,
    model: String,
    system: Option<String>,
    max_tokens: u32,
}

impl ClaudeGenerator {
    /// Creates a new generator with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            system: None,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Resolves the API key through `secrets`, falling back to `ANTHROPIC_API_KEY`.
    pub async fn try_from_secrets(
        secrets: &dyn SecretService,
        model: Option<String>,
    ) -> Result<Self, GenerationError> {
        let api_key = secrets
            .get_secret(CLAUDE_SECRET_NAME, Some(ANTHROPIC_API_KEY_ENV))
            .await
            .ok_or_else(|| {
                GenerationError::MissingCredentials(format!(
                    "{ANTHROPIC_API_KEY_ENV} not found in secret.json or environment variables"
                ))
            })?;

        let model = model.unwrap_or_else(|| DEFAULT_CLAUDE_MODEL.to_string());
        Ok(Self::new(api_key, model))
    }

    /// Adds a system prompt that will be sent alongside every request.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Sets the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_request(&self, prompt: &str, temperature: f32) -> CreateMessageRequest {
        CreateMessageRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: vec![ContentBlock::text(prompt)],
            }],
            max_tokens: self.max_tokens,
            temperature,
            system: self.system.clone(),
        }
    }

    async fn send_request(&self, body: &CreateMessageRequest) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(BASE_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| map_transport_error("Claude", err))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Claude error body".to_string());
            tracing::warn!(status = status.as_u16(), "[ClaudeGenerator] API error");
            return Err(map_http_error(status, body_text));
        }

        let parsed: CreateMessageResponse = response.json().await.map_err(|err| {
            GenerationError::InvalidResponse(format!("Failed to parse Claude response: {err}"))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl TextGenerator for ClaudeGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate_text(
        &self,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, GenerationError> {
        tracing::debug!(model = %self.model, temperature, "[ClaudeGenerator] Sending request");
        let request = self.build_request(prompt, temperature);
        self.send_request(&request).await
    }
}

#[derive(Serialize)]
struct CreateMessageRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Serialize)]
struct ContentBlock {
    r#type: &'static str,
    text: String,
}

impl ContentBlock {
    fn text(text: &str) -> Self {
        Self {
            r#type: "text",
            text: text.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlockResponse>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ContentBlockResponse {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

fn extract_text_response(response: CreateMessageResponse) -> Result<String, GenerationError> {
    let text: String = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlockResponse::Text { text } => Some(text),
            ContentBlockResponse::Other => None,
        })
        .collect();

    if text.trim().is_empty() {
        return Err(GenerationError::InvalidResponse(
            "Claude API returned no text in the response content".into(),
        ));
    }
    Ok(text)
}

//! OpenAiGenerator - Direct REST implementation over the OpenAI Chat Completions API.
//!
//! Credential priority: ~/.config/kambo/secret.json > `OPENAI_API_KEY`.

use async_trait::async_trait;
use kambo_core::config::DEFAULT_OPENAI_MODEL;
use kambo_core::generation::{GenerationError, TextGenerator};
use kambo_core::secret::SecretService;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::http_error::{map_http_error, map_transport_error};

const BASE_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Secret name looked up in `secret.json`.
pub const OPENAI_SECRET_NAME: &str = "openai";
/// Environment fallback for the API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Generator that talks to the OpenAI HTTP API.
#[derive(Clone)]
pub struct OpenAiGenerator {
    client: Client,
    api_key: String,
    model: String,
    system: Option<String>,
    max_tokens: Option<u32>,
    base_url: String,
}

impl OpenAiGenerator {
    /// Creates a new generator with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            system: None,
            max_tokens: None,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Resolves the API key through `secrets`.
    ///
    /// Priority:
    /// 1. `openai.api_key` in secret.json
    /// 2. `OPENAI_API_KEY`
    ///
    /// `model` falls back to `gpt-4` when absent.
    pub async fn try_from_secrets(
        secrets: &dyn SecretService,
        model: Option<String>,
    ) -> Result<Self, GenerationError> {
        let api_key = secrets
            .get_secret(OPENAI_SECRET_NAME, Some(OPENAI_API_KEY_ENV))
            .await
            .ok_or_else(|| {
                GenerationError::MissingCredentials(format!(
                    "{OPENAI_API_KEY_ENV} not found in secret.json or environment variables"
                ))
            })?;

        let model = model.unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());
        Ok(Self::new(api_key, model))
    }

    /// Adds a system message sent ahead of every prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Sets the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Points the generator at a compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_request(&self, prompt: &str, temperature: f32) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature,
            max_tokens: self.max_tokens,
        }
    }

    async fn send_request(&self, body: &ChatCompletionRequest) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| map_transport_error("OpenAI", err))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read OpenAI error body".to_string());
            tracing::warn!(status = status.as_u16(), "[OpenAiGenerator] API error");
            return Err(map_http_error(status, body_text));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|err| {
            GenerationError::InvalidResponse(format!("Failed to parse OpenAI response: {err}"))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate_text(
        &self,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, GenerationError> {
        tracing::debug!(model = %self.model, temperature, "[OpenAiGenerator] Sending request");
        let request = self.build_request(prompt, temperature);
        self.send_request(&request).await
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

fn extract_text_response(response: ChatCompletionResponse) -> Result<String, GenerationError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| {
            GenerationError::InvalidResponse("OpenAI API returned no content in the response".into())
        })
}

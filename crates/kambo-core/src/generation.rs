//! Text generation collaborator contract.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Failure modes of a generation call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// The API answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never produced a response (DNS, TLS, connection reset...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The call exceeded its time budget.
    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The response could not be decoded or carried no text.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// No API key could be resolved.
    #[error("missing credentials: {0}")]
    MissingCredentials(String),
}

/// Opaque prompt → text capability.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Identifier reported in response metadata.
    fn model_name(&self) -> &str;

    /// Generates a completion for `prompt`.
    async fn generate_text(&self, prompt: &str, temperature: f32)
    -> Result<String, GenerationError>;
}

/// Runs `generator` with an upper time bound.
///
/// A timeout is reported like any other collaborator failure.
pub async fn generate_with_timeout(
    generator: &dyn TextGenerator,
    prompt: &str,
    temperature: f32,
    limit: Duration,
) -> Result<String, GenerationError> {
    tokio::time::timeout(limit, generator.generate_text(prompt, temperature))
        .await
        .unwrap_or(Err(GenerationError::Timeout(limit)))
}

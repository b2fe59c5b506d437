//! Generation collaborators and prompt templates.

pub mod claude_generator;
mod http_error;
pub mod openai_generator;
pub mod prompts;

pub use claude_generator::ClaudeGenerator;
pub use openai_generator::OpenAiGenerator;
pub use prompts::PromptLibrary;

use kambo_core::config::{GenerationConfig, GenerationProvider};
use kambo_core::generation::{GenerationError, TextGenerator};
use kambo_core::secret::SecretService;
use std::sync::Arc;

/// Builds the configured REST generator.
///
/// # Arguments
///
/// * `config` - Provider, model and token settings
/// * `secrets` - Source for the provider's API key
///
/// # Returns
///
/// - `Ok(Arc<dyn TextGenerator>)`: Ready to use
/// - `Err(GenerationError::MissingCredentials)`: No API key could be found
pub async fn build_generator(
    config: &GenerationConfig,
    secrets: &dyn SecretService,
) -> Result<Arc<dyn TextGenerator>, GenerationError> {
    let model = Some(config.effective_model());

    let generator: Arc<dyn TextGenerator> = match config.provider {
        GenerationProvider::OpenAi => Arc::new(
            OpenAiGenerator::try_from_secrets(secrets, model)
                .await?
                .with_max_tokens(config.max_tokens),
        ),
        GenerationProvider::Claude => Arc::new(
            ClaudeGenerator::try_from_secrets(secrets, model)
                .await?
                .with_max_tokens(config.max_tokens),
        ),
    };

    tracing::info!(
        provider = ?config.provider,
        model = generator.model_name(),
        "[Interaction] Generator ready"
    );
    Ok(generator)
}

//! Response Generator: drafts an answer, optionally steered by feedback.

use kambo_core::error::PipelineError;
use kambo_core::generation::{TextGenerator, generate_with_timeout};
use kambo_interaction::PromptLibrary;
use std::sync::Arc;
use std::time::Duration;

pub struct ResponseGenerator {
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<PromptLibrary>,
    temperature: f32,
    timeout: Duration,
}

impl ResponseGenerator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        prompts: Arc<PromptLibrary>,
        temperature: f32,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            prompts,
            temperature,
            timeout,
        }
    }

    /// Produces a trimmed draft.
    ///
    /// `feedback` carries the latest verification complaint; its presence
    /// switches the prompt to the enhanced retry wording.
    ///
    /// # Errors
    ///
    /// - `GenerationFailure`: the collaborator failed, timed out or returned nothing
    /// - `UnexpectedError`: the prompt template could not be rendered
    pub async fn generate(
        &self,
        question: &str,
        context: Option<&str>,
        feedback: Option<&str>,
    ) -> Result<String, PipelineError> {
        let prompt = self
            .prompts
            .responder_prompt(question, context, feedback)
            .map_err(|e| PipelineError::UnexpectedError(format!("responder prompt: {e}")))?;

        tracing::debug!(enhanced = feedback.is_some(), "[ResponseGenerator] Generating draft");

        let draft = generate_with_timeout(
            self.generator.as_ref(),
            &prompt,
            self.temperature,
            self.timeout,
        )
        .await
        .map_err(|e| PipelineError::GenerationFailure(e.to_string()))?;

        let draft = draft.trim();
        if draft.is_empty() {
            return Err(PipelineError::GenerationFailure(
                "generator returned an empty draft".to_string(),
            ));
        }
        Ok(draft.to_string())
    }
}

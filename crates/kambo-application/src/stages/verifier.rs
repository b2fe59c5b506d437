//! Compliance Verifier: flags drafts that contain medical advice.
//!
//! Fails closed. A collaborator failure yields an unsafe verdict, which sends
//! the run back through regeneration like any other violation.

use kambo_core::error::PipelineError;
use kambo_core::generation::{TextGenerator, generate_with_timeout};
use kambo_core::verdict::{VerificationOutcome, parse_verification};
use kambo_interaction::PromptLibrary;
use std::sync::Arc;
use std::time::Duration;

pub struct ComplianceVerifier {
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<PromptLibrary>,
    temperature: f32,
    timeout: Duration,
}

impl ComplianceVerifier {
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

    /// Checks `draft` against the medical-advice policy.
    ///
    /// Only a defect (the prompt cannot be rendered) is returned as an error.
    pub async fn verify(
        &self,
        question: &str,
        draft: &str,
    ) -> Result<VerificationOutcome, PipelineError> {
        let prompt = self
            .prompts
            .verifier_prompt(question, draft)
            .map_err(|e| PipelineError::UnexpectedError(format!("verifier prompt: {e}")))?;

        let outcome = match generate_with_timeout(
            self.generator.as_ref(),
            &prompt,
            self.temperature,
            self.timeout,
        )
        .await
        {
            Ok(raw) => parse_verification(&raw),
            Err(e) => {
                tracing::warn!(error = %e, "[ComplianceVerifier] Verifier call failed, treating draft as unsafe");
                VerificationOutcome::verifier_unavailable(e.to_string())
            }
        };

        tracing::debug!(
            is_safe = outcome.is_safe,
            tags = ?outcome.violation_tags,
            "[ComplianceVerifier] Verified draft"
        );
        Ok(outcome)
    }
}

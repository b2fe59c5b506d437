//! Topic Classifier: is the question inside the allowed domain?
//!
//! Fails open. When the collaborator errors or times out the question is let
//! through, unlike moderation and verification which fail closed.

use kambo_core::generation::{TextGenerator, generate_with_timeout};
use kambo_core::verdict::parse_topic_answer;
use kambo_interaction::PromptLibrary;
use std::sync::Arc;
use std::time::Duration;

/// Prefix of the detail recorded when the classifier failed open.
const CLASSIFICATION_UNAVAILABLE: &str = "classification unavailable";

/// Result of one classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicVerdict {
    pub on_topic: bool,
    /// Set when the collaborator failed and the question was allowed anyway.
    pub failed_open: bool,
    pub detail: String,
}

pub struct TopicClassifier {
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<PromptLibrary>,
    domain_definition: String,
    temperature: f32,
    timeout: Duration,
}

impl TopicClassifier {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        prompts: Arc<PromptLibrary>,
        domain_definition: impl Into<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            prompts,
            domain_definition: domain_definition.into(),
            temperature,
            timeout,
        }
    }

    pub async fn classify_on_topic(&self, question: &str) -> TopicVerdict {
        let prompt = match self.prompts.topic_prompt(question, &self.domain_definition) {
            Ok(prompt) => prompt,
            Err(e) => return Self::fail_open(format!("prompt rendering failed: {e}")),
        };

        match generate_with_timeout(self.generator.as_ref(), &prompt, self.temperature, self.timeout)
            .await
        {
            Ok(raw) => {
                let on_topic = parse_topic_answer(&raw);
                tracing::debug!(on_topic, answer = %raw.trim(), "[TopicClassifier] Classified");
                TopicVerdict {
                    on_topic,
                    failed_open: false,
                    detail: raw.trim().to_string(),
                }
            }
            Err(e) => Self::fail_open(e.to_string()),
        }
    }

    fn fail_open(reason: String) -> TopicVerdict {
        tracing::warn!(reason = %reason, "[TopicClassifier] Classification failed, allowing question");
        TopicVerdict {
            on_topic: true,
            failed_open: true,
            detail: format!("{CLASSIFICATION_UNAVAILABLE}: {reason}"),
        }
    }
}

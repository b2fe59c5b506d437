//! Session state threaded through one pipeline run.
//!
//! Every stage consumes the state and hands back an updated copy. Fields are
//! filled in as the run advances and are never rolled back.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::messages::fallback_message;
use crate::verdict::VerificationOutcome;

/// User id used when the caller does not supply one.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Position of a run in the pipeline graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Validate,
    Moderate,
    Classify,
    Generate,
    Verify,
    Final,
    Fail,
}

/// Pass/fail result of a gate stage with its reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutcome {
    pub passed: bool,
    pub detail: String,
}

impl StageOutcome {
    pub fn passed(detail: impl Into<String>) -> Self {
        Self {
            passed: true,
            detail: detail.into(),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            passed: false,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    raw_message: String,
    pub sanitized_message: Option<String>,
    user_id: String,
    run_id: String,
    pub validation_outcome: Option<StageOutcome>,
    pub moderation_outcome: Option<StageOutcome>,
    pub topic_outcome: Option<StageOutcome>,
    /// Set when the classifier was unavailable and the question was let through.
    #[serde(default)]
    pub topic_failed_open: bool,
    pub draft_response: Option<String>,
    pub verification_outcome: Option<VerificationOutcome>,
    pub attempt_count: u32,
    pub feedback_history: Vec<String>,
    pub final_response: Option<String>,
    pub error: Option<PipelineError>,
}

impl SessionState {
    /// Starts a run. A blank `user_id` becomes [`ANONYMOUS_USER`].
    pub fn new(raw_message: impl Into<String>, user_id: &str) -> Self {
        let user_id = match user_id.trim() {
            "" => ANONYMOUS_USER.to_string(),
            trimmed => trimmed.to_string(),
        };

        Self {
            raw_message: raw_message.into(),
            sanitized_message: None,
            user_id,
            run_id: Uuid::new_v4().to_string(),
            validation_outcome: None,
            moderation_outcome: None,
            topic_outcome: None,
            topic_failed_open: false,
            draft_response: None,
            verification_outcome: None,
            attempt_count: 0,
            feedback_history: Vec::new(),
            final_response: None,
            error: None,
        }
    }

    pub fn raw_message(&self) -> &str {
        &self.raw_message
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Records the Input Guard verdict. `sanitized` is only kept on success.
    pub fn with_validation(mut self, outcome: StageOutcome, sanitized: Option<String>) -> Self {
        if outcome.passed {
            self.sanitized_message = sanitized;
        }
        self.validation_outcome = Some(outcome);
        self
    }

    pub fn with_moderation(mut self, outcome: StageOutcome) -> Self {
        self.moderation_outcome = Some(outcome);
        self
    }

    pub fn with_topic(mut self, outcome: StageOutcome, failed_open: bool) -> Self {
        self.topic_outcome = Some(outcome);
        self.topic_failed_open = failed_open;
        self
    }

    /// Replaces the draft with the latest generation.
    pub fn with_draft(mut self, draft: String) -> Self {
        self.draft_response = Some(draft);
        self
    }

    pub fn with_verification(mut self, outcome: VerificationOutcome) -> Self {
        self.verification_outcome = Some(outcome);
        self
    }

    /// Counts one failed verification and remembers why it failed.
    pub fn with_retry(mut self, feedback: String) -> Self {
        self.attempt_count += 1;
        self.feedback_history.push(feedback);
        self
    }

    /// Feedback for the next regeneration; only the newest entry is used.
    pub fn latest_feedback(&self) -> Option<&str> {
        self.feedback_history.last().map(String::as_str)
    }

    /// Terminal success.
    pub fn succeed(mut self, final_response: String) -> Self {
        if self.final_response.is_none() {
            self.final_response = Some(final_response);
        }
        self
    }

    /// Terminal failure; the final response becomes the fixed fallback text.
    pub fn fail(mut self, error: PipelineError) -> Self {
        if self.final_response.is_none() {
            self.final_response = Some(fallback_message(&error).to_string());
            self.error = Some(error);
        }
        self
    }

    pub fn is_finished(&self) -> bool {
        self.final_response.is_some()
    }

    /// Whether the run counts as a successful interaction.
    pub fn is_success(&self) -> bool {
        self.is_finished()
            && self
                .error
                .as_ref()
                .is_none_or(PipelineError::counts_as_success)
    }
}

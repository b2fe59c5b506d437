//! Orchestrator: the validate → moderate → classify → generate ⇄ verify graph.
//!
//! One call to [`Orchestrator::process`] is one run. The run owns its
//! [`SessionState`]; every stage takes the state by value and hands back the
//! next one. The only cycle is generate ⇄ verify, bounded by `max_attempts`.

use futures::FutureExt;
use kambo_core::config::AppConfig;
use kambo_core::error::{KamboError, PipelineError};
use kambo_core::generation::TextGenerator;
use kambo_core::guard::InputGuard;
use kambo_core::messages::{GENERIC_ERROR_MESSAGE, compose_final_response};
use kambo_core::moderation::{ContentModerator, KeywordModerator, ModerationOutcome};
use kambo_core::repository::{
    InteractionRecord, InteractionRecorder, SecurityEvent, SecurityEventType,
};
use kambo_core::retrieval::{ContextRetriever, EmptyRetriever};
use kambo_core::state::{SessionState, Stage, StageOutcome};
use kambo_interaction::PromptLibrary;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::stages::{ComplianceVerifier, ResponseGenerator, TopicClassifier};

/// What the transport layer gets back from a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub success: bool,
    /// Never empty: the answer or a fixed fallback text.
    pub response: String,
    pub run_id: String,
    pub metadata: ResponseMetadata,
    /// Error kind label; internal detail is never exposed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Diagnostic, non-binding information about a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub model: String,
    pub attempt_count: u32,
    /// Where the run ended.
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_topic: Option<bool>,
    pub topic_check_failed_open: bool,
}

/// Result of one stage: `Err` carries a state that has already terminated.
type Step = Result<SessionState, SessionState>;

pub struct Orchestrator {
    guard: InputGuard,
    moderator: Arc<dyn ContentModerator>,
    classifier: TopicClassifier,
    responder: ResponseGenerator,
    verifier: ComplianceVerifier,
    retriever: Arc<dyn ContextRetriever>,
    recorder: Arc<dyn InteractionRecorder>,
    max_attempts: u32,
    disclaimer: String,
    collaborator_timeout: Duration,
    model_name: String,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl Orchestrator {
    /// Wires the pipeline from configuration and injected collaborators.
    ///
    /// Moderation defaults to [`KeywordModerator`] and retrieval to
    /// [`EmptyRetriever`]; replace them with the `with_*` builders.
    ///
    /// # Arguments
    ///
    /// * `config` - Guard limits, temperatures, timeout, retry bound, disclaimer
    /// * `generator` - Shared by the classifier, responder and verifier
    /// * `recorder` - Receives interactions and security events
    pub fn new(
        config: &AppConfig,
        generator: Arc<dyn TextGenerator>,
        recorder: Arc<dyn InteractionRecorder>,
    ) -> Result<Self, KamboError> {
        let prompts = Arc::new(
            PromptLibrary::new()
                .map_err(|e| KamboError::internal(format!("prompt templates: {e}")))?,
        );
        let generation = &config.generation;
        let timeout = generation.timeout();

        Ok(Self {
            guard: InputGuard::new(&config.guard),
            moderator: Arc::new(KeywordModerator::new()),
            classifier: TopicClassifier::new(
                generator.clone(),
                prompts.clone(),
                config.pipeline.domain_definition.clone(),
                generation.classifier_temperature,
                timeout,
            ),
            responder: ResponseGenerator::new(
                generator.clone(),
                prompts.clone(),
                generation.responder_temperature,
                timeout,
            ),
            verifier: ComplianceVerifier::new(
                generator.clone(),
                prompts,
                generation.verifier_temperature,
                timeout,
            ),
            retriever: Arc::new(EmptyRetriever),
            recorder,
            max_attempts: config.pipeline.max_attempts,
            disclaimer: config.pipeline.disclaimer.clone(),
            collaborator_timeout: timeout,
            model_name: generator.model_name().to_string(),
            background: Mutex::new(Vec::new()),
        })
    }

    pub fn with_moderator(mut self, moderator: Arc<dyn ContentModerator>) -> Self {
        self.moderator = moderator;
        self
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn ContextRetriever>) -> Self {
        self.retriever = retriever;
        self
    }

    /// Runs the pipeline for one message.
    ///
    /// Never fails: every outcome, including a defect inside a stage, is
    /// turned into a response with a non-empty text.
    pub async fn process(&self, message: &str, user_id: &str) -> ProcessResponse {
        let state = SessionState::new(message, user_id);
        let span = tracing::info_span!(
            "pipeline_run",
            run_id = %state.run_id(),
            user_id = %state.user_id()
        );

        let fallback = state.clone();
        let finished = AssertUnwindSafe(self.run(state))
            .catch_unwind()
            .instrument(span.clone())
            .await
            .unwrap_or_else(|_| {
                span.in_scope(|| tracing::error!("[Orchestrator] Stage panicked"));
                fallback.fail(PipelineError::UnexpectedError("stage panicked".to_string()))
            });

        span.in_scope(|| self.respond(finished))
    }

    /// Waits for the persistence writes dispatched so far.
    ///
    /// Runs never wait on persistence; short-lived callers use this before
    /// shutting the runtime down so queued records are not lost.
    pub async fn flush(&self) {
        let pending = match self.background.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => return,
        };
        for handle in pending {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "[Orchestrator] Background write did not complete");
            }
        }
    }

    async fn run(&self, state: SessionState) -> SessionState {
        tracing::info!(stage = %Stage::Validate, "[Orchestrator] Run started");
        match self.advance(state).await {
            Ok(state) | Err(state) => state,
        }
    }

    async fn advance(&self, state: SessionState) -> Step {
        let state = self.validate(state)?;
        let Some(question) = state.sanitized_message.clone() else {
            return Err(state.fail(PipelineError::UnexpectedError(
                "validated state has no sanitized message".to_string(),
            )));
        };

        let state = self.moderate(state, &question).await?;
        let state = self.classify(state, &question).await?;
        let context = self.retrieve_context(&question).await;
        let state = self.generate_and_verify(state, &question, context.as_deref()).await?;
        Ok(self.finalize(state, &question))
    }

    fn validate(&self, state: SessionState) -> Step {
        let outcome = self.guard.check(state.raw_message(), state.user_id());
        let summary = outcome.detail.summary();

        if outcome.accepted {
            return Ok(state.with_validation(StageOutcome::passed(summary), Some(outcome.cleaned_text)));
        }

        if outcome.detail.is_adversarial() {
            let detail = serde_json::to_value(&outcome.detail)
                .unwrap_or_else(|_| serde_json::json!({ "summary": summary }));
            self.dispatch_security_event(
                SecurityEventType::InputValidationFailed,
                state.user_id(),
                detail,
            );
        }

        Err(state
            .with_validation(StageOutcome::failed(summary.clone()), None)
            .fail(PipelineError::ValidationFailure(summary)))
    }

    async fn moderate(&self, state: SessionState, question: &str) -> Step {
        let outcome = match tokio::time::timeout(
            self.collaborator_timeout,
            self.moderator.moderate(question),
        )
        .await
        {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "[Orchestrator] Moderation failed, rejecting");
                ModerationOutcome::failed(vec!["moderation_error".to_string()])
            }
            Err(_) => {
                tracing::warn!("[Orchestrator] Moderation timed out, rejecting");
                ModerationOutcome::failed(vec!["moderation_timeout".to_string()])
            }
        };

        if outcome.passed {
            return Ok(state.with_moderation(StageOutcome::passed("no violations")));
        }

        let violations = outcome.violations;
        tracing::warn!(violations = ?violations, "[Orchestrator] Moderation rejected message");
        self.dispatch_security_event(
            SecurityEventType::ModerationFailed,
            state.user_id(),
            serde_json::json!({ "violations": violations }),
        );

        Err(state
            .with_moderation(StageOutcome::failed(violations.join(", ")))
            .fail(PipelineError::ModerationFailure(violations)))
    }

    async fn classify(&self, state: SessionState, question: &str) -> Step {
        let verdict = self.classifier.classify_on_topic(question).await;
        let state = state.with_topic(
            StageOutcome {
                passed: verdict.on_topic,
                detail: verdict.detail,
            },
            verdict.failed_open,
        );

        if verdict.on_topic {
            Ok(state)
        } else {
            tracing::info!("[Orchestrator] Off-topic question rejected");
            Err(state.fail(PipelineError::OffTopicRejection))
        }
    }

    /// Best-effort; any failure means no context.
    async fn retrieve_context(&self, question: &str) -> Option<String> {
        match tokio::time::timeout(
            self.collaborator_timeout,
            self.retriever.retrieve_context(question),
        )
        .await
        {
            Ok(Ok(context)) if !context.trim().is_empty() => Some(context),
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "[Orchestrator] Context retrieval failed");
                None
            }
            Err(_) => {
                tracing::warn!("[Orchestrator] Context retrieval timed out");
                None
            }
        }
    }

    /// The bounded generate ⇄ verify loop.
    async fn generate_and_verify(
        &self,
        mut state: SessionState,
        question: &str,
        context: Option<&str>,
    ) -> Step {
        loop {
            let draft = match self
                .responder
                .generate(question, context, state.latest_feedback())
                .await
            {
                Ok(draft) => draft,
                Err(e) => {
                    tracing::error!(error = %e, attempt = state.attempt_count, "[Orchestrator] Generation failed");
                    return Err(state.fail(e));
                }
            };

            let outcome = match self.verifier.verify(question, &draft).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(error = %e, "[Orchestrator] Verifier defect");
                    return Err(state.with_draft(draft).fail(e));
                }
            };

            let is_safe = outcome.is_safe;
            let feedback = outcome.feedback();
            state = state.with_draft(draft).with_verification(outcome);

            if is_safe {
                tracing::info!(attempt = state.attempt_count, "[Orchestrator] Draft verified");
                return Ok(state);
            }

            if state.attempt_count >= self.max_attempts {
                tracing::warn!(
                    attempts = state.attempt_count,
                    "[Orchestrator] Verification exhausted, returning safe fallback"
                );
                let attempts = state.attempt_count;
                return Err(state.fail(PipelineError::VerificationExhausted { attempts }));
            }

            tracing::info!(
                attempt = state.attempt_count + 1,
                feedback = %feedback,
                "[Orchestrator] Draft rejected, regenerating"
            );
            state = state.with_retry(feedback);
        }
    }

    fn finalize(&self, state: SessionState, question: &str) -> SessionState {
        let draft = state.draft_response.clone().unwrap_or_default();
        let final_response = compose_final_response(&draft, &self.disclaimer, state.attempt_count);

        self.dispatch_interaction(InteractionRecord::new(
            state.run_id(),
            state.user_id(),
            question,
            final_response.clone(),
        ));

        state.succeed(final_response)
    }

    fn respond(&self, state: SessionState) -> ProcessResponse {
        let stage = match &state.error {
            None => Stage::Final,
            Some(PipelineError::VerificationExhausted { .. }) => Stage::Verify,
            Some(PipelineError::ValidationFailure(_)) => Stage::Validate,
            Some(PipelineError::ModerationFailure(_)) => Stage::Moderate,
            Some(PipelineError::OffTopicRejection) => Stage::Classify,
            Some(_) => Stage::Fail,
        };
        let success = state.is_success();
        let error = state.error.as_ref().map(|e| e.kind().to_string());

        tracing::info!(
            success,
            attempts = state.attempt_count,
            error = error.as_deref().unwrap_or("none"),
            "[Orchestrator] Run finished"
        );

        ProcessResponse {
            success,
            response: state
                .final_response
                .clone()
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
            run_id: state.run_id().to_string(),
            metadata: ResponseMetadata {
                model: self.model_name.clone(),
                attempt_count: state.attempt_count,
                stage,
                on_topic: state.topic_outcome.as_ref().map(|t| t.passed),
                topic_check_failed_open: state.topic_failed_open,
            },
            error,
        }
    }

    fn dispatch_interaction(&self, record: InteractionRecord) {
        let recorder = Arc::clone(&self.recorder);
        self.track(tokio::spawn(
            async move {
                if let Err(e) = recorder.record_interaction(record).await {
                    tracing::warn!(error = %e, "[Orchestrator] Failed to record interaction");
                }
            }
            .in_current_span(),
        ));
    }

    fn dispatch_security_event(
        &self,
        event_type: SecurityEventType,
        user_id: &str,
        detail: serde_json::Value,
    ) {
        tracing::warn!(event_type = event_type.as_str(), "[Orchestrator] Security event");
        let event = SecurityEvent::new(event_type, user_id, detail);
        let recorder = Arc::clone(&self.recorder);
        self.track(tokio::spawn(
            async move {
                if let Err(e) = recorder.record_security_event(event).await {
                    tracing::warn!(error = %e, "[Orchestrator] Failed to record security event");
                }
            }
            .in_current_span(),
        ));
    }

    /// Keeps the handle for [`Orchestrator::flush`]; finished writes are dropped.
    fn track(&self, handle: JoinHandle<()>) {
        if let Ok(mut pending) = self.background.lock() {
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
        }
    }
}

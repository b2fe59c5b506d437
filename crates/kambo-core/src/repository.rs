//! Persistence collaborator contract.
//!
//! The orchestrator only hands records over; durability belongs to the
//! implementation. Calls are dispatched fire-and-forget, so an `Err` here is
//! logged and otherwise ignored.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// One completed question/answer exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub run_id: String,
    pub user_id: String,
    pub question: String,
    pub answer: String,
    pub recorded_at: DateTime<Utc>,
}

impl InteractionRecord {
    pub fn new(
        run_id: impl Into<String>,
        user_id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            user_id: user_id.into(),
            question: question.into(),
            answer: answer.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// Kind of security-relevant rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEventType {
    InputValidationFailed,
    ModerationFailed,
}

impl SecurityEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InputValidationFailed => "input_validation_failed",
            Self::ModerationFailed => "moderation_failed",
        }
    }
}

/// Audit record for an adversarial or harmful input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub id: String,
    pub event_type: SecurityEventType,
    pub user_id: String,
    pub detail: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

impl SecurityEvent {
    pub fn new(
        event_type: SecurityEventType,
        user_id: impl Into<String>,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type,
            user_id: user_id.into(),
            detail,
            recorded_at: Utc::now(),
        }
    }
}

/// Records conversations and security events.
#[async_trait]
pub trait InteractionRecorder: Send + Sync {
    /// Stores a completed interaction.
    async fn record_interaction(&self, record: InteractionRecord) -> Result<()>;

    /// Stores a security event.
    async fn record_security_event(&self, event: SecurityEvent) -> Result<()>;
}

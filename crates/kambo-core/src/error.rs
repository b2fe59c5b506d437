//! Error types for the Kambo assistant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for storage, configuration and other plumbing.
///
/// Pipeline outcomes are described by [`PipelineError`]; this type covers the
/// collaborators around it (files, serialization, secrets).
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum KamboError {
    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Data access error (repository/storage layer)
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl KamboError {
    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a DataAccess error
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<std::io::Error> for KamboError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for KamboError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for KamboError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for KamboError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Why a pipeline run terminated abnormally.
///
/// Only the verify → generate cycle is ever retried; every variant here is
/// terminal once it is recorded on the session state.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineError {
    /// Input Guard rejected the raw message.
    #[error("input validation failed: {0}")]
    ValidationFailure(String),

    /// Content Moderator flagged the message (or failed closed).
    #[error("moderation failed: {}", .0.join(", "))]
    ModerationFailure(Vec<String>),

    /// Topic Classifier decided the question is outside the allowed domain.
    #[error("question is off-topic")]
    OffTopicRejection,

    /// Generation collaborator failed while drafting an answer.
    #[error("generation failed: {0}")]
    GenerationFailure(String),

    /// Every regeneration still failed compliance verification.
    #[error("verification still failing after {attempts} regeneration attempts")]
    VerificationExhausted { attempts: u32 },

    /// Defect in any stage.
    #[error("unexpected error: {0}")]
    UnexpectedError(String),
}

impl PipelineError {
    /// Stable label exposed to callers in place of internal detail.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ValidationFailure(_) => "ValidationFailure",
            Self::ModerationFailure(_) => "ModerationFailure",
            Self::OffTopicRejection => "OffTopicRejection",
            Self::GenerationFailure(_) => "GenerationFailure",
            Self::VerificationExhausted { .. } => "VerificationExhausted",
            Self::UnexpectedError(_) => "UnexpectedError",
        }
    }

    /// Whether the run still counts as a successful interaction.
    ///
    /// Refusing to answer unsafely is reported as success.
    pub fn counts_as_success(&self) -> bool {
        matches!(self, Self::VerificationExhausted { .. })
    }
}

/// A type alias for `Result<T, KamboError>`.
pub type Result<T> = std::result::Result<T, KamboError>;

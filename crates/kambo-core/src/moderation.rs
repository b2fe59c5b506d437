//! Content Moderator: keyword scan for self-harm and hate-speech indicators.
//!
//! Runs on the sanitized message, independent of the topic check.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Category of a moderation hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModerationCategory {
    SelfHarm,
    HateSpeech,
}

/// Indicator phrases: (phrase, category). Matched as lowercase substrings.
const INDICATOR_PHRASES: &[(&str, ModerationCategory)] = &[
    ("kill myself", ModerationCategory::SelfHarm),
    ("killing myself", ModerationCategory::SelfHarm),
    ("suicide", ModerationCategory::SelfHarm),
    ("suicidal", ModerationCategory::SelfHarm),
    ("self-harm", ModerationCategory::SelfHarm),
    ("self harm", ModerationCategory::SelfHarm),
    ("hurt myself", ModerationCategory::SelfHarm),
    ("end my life", ModerationCategory::SelfHarm),
    ("want to die", ModerationCategory::SelfHarm),
    ("overdose on purpose", ModerationCategory::SelfHarm),
    ("subhuman", ModerationCategory::HateSpeech),
    ("ethnic cleansing", ModerationCategory::HateSpeech),
    ("racial purity", ModerationCategory::HateSpeech),
    ("inferior race", ModerationCategory::HateSpeech),
    ("exterminate them", ModerationCategory::HateSpeech),
    ("gas the", ModerationCategory::HateSpeech),
];

/// Outcome of a moderation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationOutcome {
    pub passed: bool,
    /// Matched categories (deduplicated, in first-match order).
    pub violations: Vec<String>,
}

impl ModerationOutcome {
    pub fn passed() -> Self {
        Self {
            passed: true,
            violations: Vec::new(),
        }
    }

    pub fn failed(violations: Vec<String>) -> Self {
        Self {
            passed: false,
            violations,
        }
    }
}

/// Moderation contract used by the orchestrator.
///
/// An `Err` is treated by the caller as a failed moderation (fail closed).
#[async_trait]
pub trait ContentModerator: Send + Sync {
    async fn moderate(&self, cleaned_text: &str) -> Result<ModerationOutcome, String>;
}

/// Case-insensitive substring scan over a fixed phrase list.
#[derive(Debug, Clone, Default)]
pub struct KeywordModerator {
    extra_phrases: Vec<(String, ModerationCategory)>,
}

impl KeywordModerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a deployment-specific phrase on top of the built-in list.
    pub fn with_phrase(mut self, phrase: impl Into<String>, category: ModerationCategory) -> Self {
        self.extra_phrases
            .push((phrase.into().to_lowercase(), category));
        self
    }

    /// Synchronous scan, exposed for callers that do not need the trait.
    pub fn scan(&self, text: &str) -> ModerationOutcome {
        let lower = text.to_lowercase();
        let mut categories: Vec<ModerationCategory> = Vec::new();

        let mut note = |phrase: &str, category: ModerationCategory| {
            if lower.contains(phrase) && !categories.contains(&category) {
                categories.push(category);
            }
        };
        for (phrase, category) in INDICATOR_PHRASES {
            note(phrase, *category);
        }
        for (phrase, category) in &self.extra_phrases {
            note(phrase, *category);
        }

        if categories.is_empty() {
            ModerationOutcome::passed()
        } else {
            ModerationOutcome::failed(categories.iter().map(|c| c.to_string()).collect())
        }
    }
}

#[async_trait]
impl ContentModerator for KeywordModerator {
    async fn moderate(&self, cleaned_text: &str) -> Result<ModerationOutcome, String> {
        Ok(self.scan(cleaned_text))
    }
}

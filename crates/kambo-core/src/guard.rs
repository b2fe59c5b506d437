//! Input Guard: length limits, attack-pattern screening and sanitization.
//!
//! Patterns are matched case-insensitively against the **raw** message.
//! Sanitization only runs on accepted input.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::config::GuardConfig;

/// Family an attack pattern belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PatternCategory {
    InstructionOverride,
    MarkupInjection,
    SqlKeyword,
    ShellMetacharacter,
    PathTraversal,
    DynamicImport,
}

const PATTERN_SOURCES: &[(PatternCategory, &str)] = &[
    (PatternCategory::InstructionOverride, r"ignore.*previous.*instructions"),
    (PatternCategory::InstructionOverride, r"forget.*previous.*instructions"),
    (PatternCategory::InstructionOverride, r"system.*prompt"),
    (PatternCategory::InstructionOverride, r"ignore.*above"),
    (PatternCategory::InstructionOverride, r"disregard.*previous"),
    (PatternCategory::InstructionOverride, r"disregard.*all.*above"),
    (PatternCategory::MarkupInjection, r"<script.*?>"),
    (PatternCategory::MarkupInjection, r"javascript:"),
    (PatternCategory::MarkupInjection, r"on\w+\s*="),
    (PatternCategory::MarkupInjection, r"eval\s*\("),
    (PatternCategory::MarkupInjection, r"exec\s*\("),
    (
        PatternCategory::SqlKeyword,
        r"\b(union|select|insert|update|delete|drop|create|alter)\b",
    ),
    (PatternCategory::ShellMetacharacter, r"[;&|`$]"),
    (PatternCategory::PathTraversal, r"\.\./"),
    (PatternCategory::PathTraversal, r"\.\.\\"),
    (PatternCategory::DynamicImport, r"import\s+os"),
    (PatternCategory::DynamicImport, r"import\s+subprocess"),
    (PatternCategory::DynamicImport, r"__import__"),
];

struct CompiledPattern {
    category: PatternCategory,
    source: &'static str,
    regex: Regex,
}

static PATTERNS: Lazy<Vec<CompiledPattern>> = Lazy::new(|| {
    PATTERN_SOURCES
        .iter()
        .filter_map(|&(category, source)| {
            Regex::new(&format!("(?i){source}"))
                .map(|regex| CompiledPattern {
                    category,
                    source,
                    regex,
                })
                .map_err(|e| tracing::error!("invalid guard pattern {source}: {e}"))
                .ok()
        })
        .collect()
});

/// Entities produced by [`sanitize`]; an `&` starting one of these is left alone.
const ESCAPED_ENTITIES: &[&str] = &["&amp;", "&lt;", "&gt;", "&quot;", "&#x27;"];

/// One pattern that matched the raw message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub category: PatternCategory,
    pub pattern: String,
}

/// Why the guard refused a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum GuardRejection {
    TooLong { length: usize, max: usize },
    SuspiciousPattern,
    Empty,
}

/// Diagnostic detail produced by every guard check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardDetail {
    pub original_length: usize,
    pub matched_patterns: Vec<PatternMatch>,
    pub rejection: Option<GuardRejection>,
    pub final_length: Option<usize>,
}

impl GuardDetail {
    /// Short human-readable summary for logs and security records.
    pub fn summary(&self) -> String {
        match &self.rejection {
            None => "accepted".to_string(),
            Some(GuardRejection::Empty) => "empty message".to_string(),
            Some(GuardRejection::TooLong { length, max }) => {
                format!("input too long: {length} > {max} characters")
            }
            Some(GuardRejection::SuspiciousPattern) => {
                let categories: Vec<&str> = self
                    .matched_patterns
                    .iter()
                    .map(|m| m.category.as_ref())
                    .collect();
                format!("suspicious patterns: {}", categories.join(", "))
            }
        }
    }

    /// Empty input is a plain mistake, everything else is worth a security record.
    pub fn is_adversarial(&self) -> bool {
        matches!(
            self.rejection,
            Some(GuardRejection::TooLong { .. }) | Some(GuardRejection::SuspiciousPattern)
        )
    }
}

/// Result of [`InputGuard::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardOutcome {
    pub accepted: bool,
    pub cleaned_text: String,
    pub detail: GuardDetail,
}

/// Validates and sanitizes raw user text.
#[derive(Debug, Clone)]
pub struct InputGuard {
    max_input_length: usize,
}

impl InputGuard {
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            max_input_length: config.max_input_length,
        }
    }

    /// Screens `raw_message`; rejects over-long input instead of truncating it.
    pub fn check(&self, raw_message: &str, user_id: &str) -> GuardOutcome {
        let original_length = raw_message.chars().count();
        let matched_patterns = scan_patterns(raw_message);

        let mut detail = GuardDetail {
            original_length,
            matched_patterns,
            rejection: None,
            final_length: None,
        };

        if original_length > self.max_input_length {
            tracing::warn!(
                user_id,
                length = original_length,
                max = self.max_input_length,
                "[InputGuard] Input too long"
            );
            detail.rejection = Some(GuardRejection::TooLong {
                length: original_length,
                max: self.max_input_length,
            });
            return rejected(detail);
        }

        if !detail.matched_patterns.is_empty() {
            tracing::warn!(user_id, detail = %detail.summary(), "[InputGuard] Malicious input detected");
            detail.rejection = Some(GuardRejection::SuspiciousPattern);
            return rejected(detail);
        }

        let cleaned_text = sanitize(raw_message);
        if cleaned_text.is_empty() {
            tracing::debug!(user_id, "[InputGuard] Empty input");
            detail.rejection = Some(GuardRejection::Empty);
            return rejected(detail);
        }

        detail.final_length = Some(cleaned_text.chars().count());
        GuardOutcome {
            accepted: true,
            cleaned_text,
            detail,
        }
    }
}

fn rejected(detail: GuardDetail) -> GuardOutcome {
    GuardOutcome {
        accepted: false,
        cleaned_text: String::new(),
        detail,
    }
}

fn scan_patterns(raw_message: &str) -> Vec<PatternMatch> {
    PATTERNS
        .iter()
        .filter(|p| p.regex.is_match(raw_message))
        .map(|p| PatternMatch {
            category: p.category,
            pattern: p.source.to_string(),
        })
        .collect()
}

/// Escapes markup characters, strips angle brackets and quotes, collapses
/// whitespace runs and trims.
///
/// Idempotent: `sanitize(&sanitize(x)) == sanitize(x)`.
pub fn sanitize(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for (idx, ch) in text.char_indices() {
        match ch {
            '&' => {
                let rest = &text[idx..];
                if ESCAPED_ENTITIES.iter().any(|entity| rest.starts_with(entity)) {
                    escaped.push('&');
                } else {
                    escaped.push_str("&amp;");
                }
            }
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }

    let stripped: String = escaped
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\''))
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

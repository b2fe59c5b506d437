//! Parsers turning free-text model output into structured verdicts.
//!
//! The generation collaborator answers in prose; these functions are the only
//! place that interprets it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::{AsRefStr, Display, EnumIter, IntoEnumIterator};

/// Marker the verifier emits when the draft contains medical advice.
pub const MEDICAL_ADVICE_MARKER: &str = "MEDICAL_ADVICE";

/// Marker the verifier emits when the draft is acceptable.
pub const SAFE_MARKER: &str = "SAFE";

/// Contains [`SAFE_MARKER`] but means the opposite.
const UNSAFE_MARKER: &str = "UNSAFE";

/// Violation vocabulary understood by the Compliance Verifier.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationTag {
    Diagnosis,
    Treatment,
    Dosage,
    Cure,
    Heal,
    /// Generic tag used when the advice marker is present without a category.
    MedicalAdvice,
}

impl ViolationTag {
    /// The specific categories scanned for in verifier output.
    pub fn specific() -> impl Iterator<Item = ViolationTag> {
        ViolationTag::iter().filter(|t| *t != ViolationTag::MedicalAdvice)
    }

    /// What the regenerated answer must avoid for this tag.
    pub fn guidance(&self) -> &'static str {
        match self {
            Self::Diagnosis => "do not diagnose or suggest what condition someone has",
            Self::Treatment => "do not recommend treatments or therapeutic use",
            Self::Dosage => "do not mention doses, quantities or frequencies",
            Self::Cure => "do not claim that anything cures a condition",
            Self::Heal => "do not promise healing or health outcomes",
            Self::MedicalAdvice => "do not give medical advice of any kind",
        }
    }
}

/// Structured verdict of one compliance check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub is_safe: bool,
    pub violation_tags: BTreeSet<ViolationTag>,
    /// Raw verifier output, or a synthetic description when the verifier failed.
    pub raw_detail: String,
}

impl VerificationOutcome {
    /// Fail-closed verdict used when the verifier itself could not answer.
    pub fn verifier_unavailable(reason: impl Into<String>) -> Self {
        let mut violation_tags = BTreeSet::new();
        violation_tags.insert(ViolationTag::MedicalAdvice);
        Self {
            is_safe: false,
            violation_tags,
            raw_detail: format!("verification unavailable: {}", reason.into()),
        }
    }

    /// Feedback handed to the next generation attempt.
    pub fn feedback(&self) -> String {
        if self.violation_tags.is_empty() {
            return format!(
                "The previous answer was rejected by the compliance check ({}); {}.",
                self.raw_detail.trim(),
                ViolationTag::MedicalAdvice.guidance()
            );
        }

        let tags: Vec<&str> = self.violation_tags.iter().map(|t| t.as_ref()).collect();
        let guidance: Vec<&str> = self.violation_tags.iter().map(|t| t.guidance()).collect();
        format!(
            "The previous answer was flagged for {}; {}.",
            tags.join(", "),
            guidance.join("; ")
        )
    }
}

/// Reads the classifier's YES/NO answer.
///
/// Only a literal `YES` (any case, anywhere) counts as on-topic; everything
/// else, including malformed or empty output, is treated as NO.
pub fn parse_topic_answer(raw: &str) -> bool {
    raw.to_uppercase().contains("YES")
}

/// Reads the verifier's SAFE / MEDICAL_ADVICE answer.
///
/// `UNSAFE` does not count as the safe marker, and any mention of the
/// advice marker wins over a stray `SAFE`.
pub fn parse_verification(raw: &str) -> VerificationOutcome {
    let upper = raw.to_uppercase();
    let is_safe = upper.replace(UNSAFE_MARKER, "").contains(SAFE_MARKER)
        && !upper.contains(MEDICAL_ADVICE_MARKER);

    let mut violation_tags = BTreeSet::new();
    if !is_safe {
        violation_tags.extend(ViolationTag::specific().filter(|tag| upper.contains(tag.as_ref())));
        if violation_tags.is_empty() && upper.contains(MEDICAL_ADVICE_MARKER) {
            violation_tags.insert(ViolationTag::MedicalAdvice);
        }
    }

    VerificationOutcome {
        is_safe,
        violation_tags,
        raw_detail: raw.trim().to_string(),
    }
}

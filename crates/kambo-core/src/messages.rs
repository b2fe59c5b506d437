//! Fixed user-facing texts.
//!
//! Mapping a terminal error to what the user sees is a pure lookup.

use crate::error::PipelineError;

pub const VALIDATION_FAILURE_MESSAGE: &str =
    "I'm sorry, but I cannot process that request. Please rephrase your question.";

pub const MODERATION_FAILURE_MESSAGE: &str = "I'm not able to help with that request. If you are in crisis or thinking about harming yourself, please contact local emergency services or a crisis line right away.";

pub const OFF_TOPIC_MESSAGE: &str = "I can only answer questions related to Kambo ceremonies and traditional Amazonian medicine. Please ask about Kambo-related topics.";

pub const VERIFICATION_EXHAUSTED_MESSAGE: &str = "I apologize, but I need to provide a more appropriate response. Please consult with qualified healthcare providers for medical advice.";

pub const GENERIC_ERROR_MESSAGE: &str =
    "I apologize, but I encountered an error processing your request. Please try again.";

/// Note appended when the answer needed more than one regeneration.
pub const REFINED_NOTE: &str =
    "(This response was refined to meet our educational-content guidelines.)";

/// Returns the fallback text shown for a terminal error.
pub fn fallback_message(error: &PipelineError) -> &'static str {
    match error {
        PipelineError::ValidationFailure(_) => VALIDATION_FAILURE_MESSAGE,
        PipelineError::ModerationFailure(_) => MODERATION_FAILURE_MESSAGE,
        PipelineError::OffTopicRejection => OFF_TOPIC_MESSAGE,
        PipelineError::VerificationExhausted { .. } => VERIFICATION_EXHAUSTED_MESSAGE,
        PipelineError::GenerationFailure(_) | PipelineError::UnexpectedError(_) => {
            GENERIC_ERROR_MESSAGE
        }
    }
}

/// Builds the successful answer: draft, optional refinement note, disclaimer.
///
/// Any copy of the disclaimer already present in the draft is removed first,
/// so the result carries it exactly once.
pub fn compose_final_response(draft: &str, disclaimer: &str, attempt_count: u32) -> String {
    let body = if disclaimer.is_empty() {
        draft.trim().to_string()
    } else {
        draft.replace(disclaimer, "").trim().to_string()
    };

    let mut response = body;
    if attempt_count > 1 {
        response.push_str("\n\n");
        response.push_str(REFINED_NOTE);
    }
    response.push_str("\n\n");
    response.push_str(disclaimer);
    response
}

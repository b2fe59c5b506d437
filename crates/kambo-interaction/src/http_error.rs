//! HTTP failure mapping shared by the REST generators.

use kambo_core::generation::GenerationError;
use reqwest::StatusCode;
use serde::Deserialize;

/// Error envelope used by both OpenAI and Anthropic: `{"error": {"message": ...}}`.
#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

pub(crate) fn map_http_error(status: StatusCode, body: String) -> GenerationError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    GenerationError::Http {
        status: status.as_u16(),
        message,
    }
}

pub(crate) fn map_transport_error(provider: &str, err: reqwest::Error) -> GenerationError {
    GenerationError::Transport(format!("{provider} API request failed: {err}"))
}

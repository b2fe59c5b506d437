pub mod ask;
pub mod chat;
pub mod check;
pub mod config;
pub mod history;

use colored::Colorize;
use kambo_application::ProcessResponse;

/// Prints an answer with a short status line underneath.
pub(crate) fn print_response(response: &ProcessResponse) {
    let body = if response.success {
        response.response.bright_blue()
    } else {
        response.response.yellow()
    };
    println!("{body}");

    let mut status = format!(
        "[run {} | model {} | attempts {}",
        response.run_id, response.metadata.model, response.metadata.attempt_count
    );
    if let Some(kind) = &response.error {
        status.push_str(&format!(" | {kind}"));
    }
    status.push(']');
    println!("{}", status.bright_black());
}

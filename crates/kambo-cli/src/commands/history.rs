use anyhow::Result;
use colored::Colorize;

use crate::context::AppContext;

/// Prints the most recent `limit` records, oldest first.
pub async fn run(ctx: &AppContext, security: bool, limit: usize) -> Result<()> {
    let repo = ctx.repository().await?;

    if security {
        let events = repo.list_security_events().await?;
        if events.is_empty() {
            println!("{}", "No security events recorded.".bright_black());
        }
        for event in tail(&events, limit) {
            println!(
                "{} {} {}",
                event.recorded_at.to_rfc3339().bright_black(),
                event.event_type.as_str().red(),
                event.user_id
            );
            println!("  {}", event.detail);
        }
    } else {
        let interactions = repo.list_interactions().await?;
        if interactions.is_empty() {
            println!("{}", "No conversations recorded.".bright_black());
        }
        for record in tail(&interactions, limit) {
            println!(
                "{} {} {}",
                record.recorded_at.to_rfc3339().bright_black(),
                record.user_id.bright_magenta(),
                record.run_id.bright_black()
            );
            println!("  {} {}", "Q:".green(), record.question);
            for line in record.answer.lines() {
                println!("  {}", line.bright_blue());
            }
            println!();
        }
    }
    Ok(())
}

fn tail<T>(items: &[T], limit: usize) -> &[T] {
    &items[items.len().saturating_sub(limit)..]
}

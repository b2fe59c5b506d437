use anyhow::Result;
use colored::Colorize;
use kambo_core::guard::InputGuard;

use crate::context::AppContext;

/// Runs the input guard alone; no collaborator is contacted.
pub fn run(ctx: &AppContext, text: &str) -> Result<()> {
    let outcome = InputGuard::new(&ctx.config.guard).check(text, "cli");

    if outcome.accepted {
        println!("{}", "accepted".bright_green());
        println!("{}", outcome.cleaned_text);
    } else {
        println!("{} {}", "rejected:".red(), outcome.detail.summary());
        for hit in &outcome.detail.matched_patterns {
            println!("  {}", format!("{} /{}/", hit.category.as_ref(), hit.pattern).bright_black());
        }
    }
    Ok(())
}

use anyhow::Result;

use crate::context::AppContext;

pub async fn run(ctx: &AppContext, question: &str, user: &str, json: bool) -> Result<()> {
    let orchestrator = ctx.orchestrator().await?;
    let response = orchestrator.process(question, user).await;
    orchestrator.flush().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        super::print_response(&response);
    }
    Ok(())
}

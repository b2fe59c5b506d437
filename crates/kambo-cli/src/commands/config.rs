use anyhow::Result;
use colored::Colorize;
use kambo_core::config::{ApiKeyConfig, SecretConfig};
use kambo_core::secret::SecretService;

use crate::context::AppContext;

pub async fn run(ctx: &AppContext, init: bool) -> Result<()> {
    let path = ctx.config_service.path();
    if init {
        if ctx.config_service.init_default()? {
            println!("{} {}", "Wrote".bright_green(), path.display());
        } else {
            println!("{} {}", "Already exists:".yellow(), path.display());
        }
    }

    println!("{}", format!("# {}", path.display()).bright_black());
    println!("{}", toml::to_string_pretty(&ctx.config)?);

    println!("{}", "# credentials".bright_black());
    let secrets = ctx.secrets()?;
    let from_file = match secrets.load_secrets().await {
        Ok(config) => config,
        Err(e) => {
            println!("{} {e}", "secret.json unreadable:".red());
            SecretConfig::default()
        }
    };
    print_key("openai", from_file.openai.as_ref(), "OPENAI_API_KEY");
    print_key("claude", from_file.claude.as_ref(), "ANTHROPIC_API_KEY");

    println!("{}", "# storage".bright_black());
    println!("data_dir = {}", ctx.data_dir()?.display());
    Ok(())
}

fn print_key(name: &str, entry: Option<&ApiKeyConfig>, env_var: &str) {
    let file_key = entry.map(|e| e.api_key.trim()).filter(|k| !k.is_empty());
    let env_key = std::env::var(env_var).ok().filter(|k| !k.trim().is_empty());

    let status = match (file_key, env_key) {
        (Some(key), _) => format!("{} (secret.json)", mask(key)),
        (None, Some(key)) => format!("{} ({env_var})", mask(&key)),
        (None, None) => "not configured".yellow().to_string(),
    };
    println!("{name} = {status}");
}

/// Keeps only the last four characters visible.
fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

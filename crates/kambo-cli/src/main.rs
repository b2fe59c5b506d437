use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod context;
mod logging;

use context::AppContext;

#[derive(Parser)]
#[command(name = "kambo")]
#[command(about = "Kambo Assistant - answers questions about Kambo ceremonies, never gives medical advice", long_about = None)]
struct Cli {
    /// Use this directory instead of the platform config/data directories
    #[arg(long, global = true, value_name = "DIR")]
    home: Option<PathBuf>,

    /// Read configuration from this file instead of config.toml
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `kambo_application=debug` (RUST_LOG wins when set)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question
    Ask {
        question: String,

        /// User identifier recorded with the interaction
        #[arg(long, default_value = "")]
        user: String,

        /// Print the full response object as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start an interactive session
    Chat {
        #[arg(long, default_value = "")]
        user: String,
    },
    /// Run only the input guard on a message
    Check { text: String },
    /// Show the effective configuration
    Config {
        /// Write a default config.toml if none exists
        #[arg(long)]
        init: bool,
    },
    /// Show recorded interactions or security events
    History {
        /// List security events instead of conversations
        #[arg(long)]
        security: bool,

        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_json)?;

    let ctx = AppContext::load(cli.home.as_deref(), cli.config.as_deref())?;

    match cli.command {
        Commands::Ask {
            question,
            user,
            json,
        } => commands::ask::run(&ctx, &question, &user, json).await?,
        Commands::Chat { user } => commands::chat::run(&ctx, &user).await?,
        Commands::Check { text } => commands::check::run(&ctx, &text)?,
        Commands::Config { init } => commands::config::run(&ctx, init).await?,
        Commands::History { security, limit } => {
            commands::history::run(&ctx, security, limit).await?
        }
    }

    Ok(())
}

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{business, chat, notification, payment};

#[derive(Parser)]
#[command(name = "musika")]
#[command(about = "Musika CLI - Interact with the Musika marketplace service")]
#[command(version)]
struct Cli {
    #[arg(long, global = true, help = "API server URL")]
    server: Option<String>,

    #[arg(long, global = true, help = "Bearer token for authentication")]
    token: Option<String>,

    #[arg(long, global = true, help = "Output format", default_value = "table")]
    format: output::Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure CLI settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Register and log in businesses
    Business {
        #[command(subcommand)]
        command: business::Commands,
    },
    /// Submit, inspect and verify payments
    #[command(alias = "pay")]
    Payment {
        #[command(subcommand)]
        command: payment::Commands,
    },
    /// Chat with the platform admin
    Chat {
        #[command(subcommand)]
        command: chat::Commands,
    },
    /// Inspect the notification outbox
    #[command(alias = "notif")]
    Notification {
        #[command(subcommand)]
        command: notification::Commands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set configuration values
    Set {
        #[arg(long)]
        server: Option<String>,
        #[arg(long)]
        token: Option<String>,
    },
    /// Show current configuration
    Show,
    /// Get config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::Config::load()?;

    if let Some(server) = &cli.server {
        cfg.server = server.clone();
    }
    if let Some(token) = &cli.token {
        cfg.token = Some(token.clone());
    }

    match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Set { server, token } => {
                if let Some(s) = server {
                    cfg.server = s;
                }
                if let Some(t) = token {
                    cfg.token = Some(t);
                }
                cfg.save()?;
                println!("Configuration saved");
            }
            ConfigCommands::Show => {
                println!("Server: {}", cfg.server);
                println!(
                    "Token: {}",
                    cfg.token
                        .as_ref()
                        .map(|t| format!("{}...", &t[..12.min(t.len())]))
                        .unwrap_or_else(|| "(not set)".into())
                );
            }
            ConfigCommands::Path => {
                println!("{}", config::config_path()?.display());
            }
        },
        Commands::Business { command } => {
            business::run(command, &cfg, cli.format).await?;
        }
        Commands::Payment { command } => {
            payment::run(command, &cfg, cli.format).await?;
        }
        Commands::Chat { command } => {
            chat::run(command, &cfg, cli.format).await?;
        }
        Commands::Notification { command } => {
            notification::run(command, &cfg, cli.format).await?;
        }
    }

    Ok(())
}

use anyhow::Result;
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::config::Config;
use crate::output::{self, Format};

#[derive(Subcommand)]
pub enum Commands {
    /// Show the message history with the platform admin
    History {
        #[arg(long, help = "Business ID (admin only; defaults to own channel)")]
        business: Option<Uuid>,
    },
    /// Send a message
    Send {
        #[arg(help = "Message text")]
        message: String,
        #[arg(long, help = "Business ID (admin only; defaults to own channel)")]
        business: Option<Uuid>,
    },
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
struct ChatMessage {
    sender: String,
    sender_type: String,
    message: String,
    created_at: String,
}

#[derive(Debug, Serialize)]
struct SendRequest {
    message: String,
}

pub async fn run(cmd: Commands, config: &Config, format: Format) -> Result<()> {
    let client = ApiClient::new(config);

    match cmd {
        Commands::History { business } => {
            let url = match business {
                Some(id) => format!("/api/admin/chat/{}", id),
                None => "/api/chat/messages".to_string(),
            };
            let messages: Vec<ChatMessage> = client.get(&url).await?;
            output::print_items(messages, format);
        }
        Commands::Send { message, business } => {
            let url = match business {
                Some(id) => format!("/api/admin/chat/{}", id),
                None => "/api/chat/messages".to_string(),
            };
            let sent: ChatMessage = client.post(&url, &SendRequest { message }).await?;
            output::print_item(sent, format);
        }
    }

    Ok(())
}

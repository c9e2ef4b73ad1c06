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
    /// List queued notification emails (admin)
    List {
        #[arg(long, default_value = "50")]
        limit: i64,
        #[arg(long)]
        offset: Option<i64>,
        #[arg(long, help = "Filter by status: pending, retrying, sent, failed")]
        status: Option<String>,
    },
    /// Re-queue a failed notification (admin)
    Retry {
        #[arg(help = "Notification ID")]
        id: Uuid,
    },
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
struct Notification {
    id: Uuid,
    recipient: String,
    subject: String,
    status: String,
    attempts: i32,
    max_attempts: i32,
    #[tabled(display_with = "display_option")]
    last_error: Option<String>,
}

fn display_option(o: &Option<String>) -> String {
    o.clone().unwrap_or_else(|| "-".into())
}

pub async fn run(cmd: Commands, config: &Config, format: Format) -> Result<()> {
    let client = ApiClient::new(config);

    match cmd {
        Commands::List {
            limit,
            offset,
            status,
        } => {
            let mut url = format!("/api/admin/notifications?limit={}", limit);
            if let Some(off) = offset {
                url.push_str(&format!("&offset={}", off));
            }
            if let Some(s) = status {
                url.push_str(&format!("&status={}", s));
            }
            let notifications: Vec<Notification> = client.get(&url).await?;
            output::print_items(notifications, format);
        }
        Commands::Retry { id } => {
            let notification: Notification = client
                .post(&format!("/api/admin/notifications/{}/retry", id), &())
                .await?;
            output::print_success("Notification queued for retry");
            output::print_single(notification);
        }
    }

    Ok(())
}

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
    /// Submit a payment claim for the configured business
    Submit {
        #[arg(long, help = "Phone number the payment was made from")]
        phone: String,
        #[arg(long, help = "Mobile-money or bank transaction reference")]
        transaction_id: String,
        #[arg(long, help = "ecocash, onemoney, telecash or bank_transfer")]
        method: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show the latest payment and activation state
    Status,
    /// List payments (admin)
    List {
        #[arg(long, default_value = "50")]
        limit: i64,
        #[arg(long)]
        offset: Option<i64>,
        #[arg(long, help = "Filter by status: pending, verified, rejected")]
        status: Option<String>,
    },
    /// Mark a payment as verified and activate the business (admin)
    Verify {
        #[arg(help = "Payment ID")]
        id: Uuid,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Mark a payment as rejected and deactivate the business (admin)
    Reject {
        #[arg(help = "Payment ID")]
        id: Uuid,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct SubmitRequest {
    phone_number: String,
    transaction_id: String,
    payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SubmitResponse {
    payment_id: Uuid,
    message: String,
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
struct Payment {
    id: Uuid,
    business_id: Uuid,
    amount: String,
    payment_method: String,
    transaction_id: String,
    status: String,
    #[tabled(display_with = "display_option")]
    verified_by: Option<String>,
    created_at: String,
}

fn display_option(o: &Option<String>) -> String {
    o.clone().unwrap_or_else(|| "-".into())
}

#[derive(Debug, Serialize, Deserialize)]
struct ActivationSummary {
    payment_status: String,
    is_active: bool,
    subscription_expiry: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StatusResponse {
    payment: Option<Payment>,
    business: ActivationSummary,
}

#[derive(Debug, Serialize)]
struct DecisionRequest {
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DecisionResponse {
    message: String,
}

pub async fn run(cmd: Commands, config: &Config, format: Format) -> Result<()> {
    let client = ApiClient::new(config);

    match cmd {
        Commands::Submit {
            phone,
            transaction_id,
            method,
            notes,
        } => {
            let req = SubmitRequest {
                phone_number: phone,
                transaction_id,
                payment_method: method,
                notes,
            };
            let resp: SubmitResponse = client.post("/api/payments/submit", &req).await?;

            match format {
                Format::Json => output::print_json(&resp),
                Format::Table => {
                    output::print_success(&resp.message);
                    println!("Payment ID: {}", resp.payment_id);
                }
            }
        }
        Commands::Status => {
            let resp: StatusResponse = client.get("/api/payments/status").await?;

            match format {
                Format::Json => output::print_json(&resp),
                Format::Table => {
                    println!("Payment Status:      {}", resp.business.payment_status);
                    println!("Active:              {}", resp.business.is_active);
                    println!(
                        "Subscription Expiry: {}",
                        resp.business.subscription_expiry.as_deref().unwrap_or("-")
                    );
                    println!();
                    match resp.payment {
                        Some(payment) => output::print_single(payment),
                        None => println!("No payments submitted yet"),
                    }
                }
            }
        }
        Commands::List {
            limit,
            offset,
            status,
        } => {
            let mut url = format!("/api/admin/payments?limit={}", limit);
            if let Some(off) = offset {
                url.push_str(&format!("&offset={}", off));
            }
            if let Some(s) = status {
                url.push_str(&format!("&status={}", s));
            }
            let payments: Vec<Payment> = client.get(&url).await?;
            output::print_items(payments, format);
        }
        Commands::Verify { id, notes } => {
            let req = DecisionRequest {
                outcome: "verified",
                notes,
            };
            let resp: DecisionResponse = client
                .post(&format!("/api/payments/verify/{}", id), &req)
                .await?;
            output::print_success(&resp.message);
        }
        Commands::Reject { id, notes } => {
            let req = DecisionRequest {
                outcome: "rejected",
                notes,
            };
            let resp: DecisionResponse = client
                .post(&format!("/api/payments/verify/{}", id), &req)
                .await?;
            output::print_success(&resp.message);
        }
    }

    Ok(())
}

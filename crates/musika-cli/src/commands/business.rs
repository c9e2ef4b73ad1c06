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
    /// Register a new business account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        password: String,
        #[arg(long, help = "retail, wholesale, service, manufacturing, technology, food, fashion or other")]
        business_type: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        website: Option<String>,
    },
    /// Log in and obtain a bearer token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[derive(Debug, Serialize)]
struct RegisterRequest {
    business_name: String,
    owner_name: String,
    email: String,
    phone: String,
    password: String,
    business_type: String,
    description: String,
    address: String,
    city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    website: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RegisterResponse {
    business_id: Uuid,
    message: String,
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
struct BusinessProfile {
    id: Uuid,
    business_name: String,
    email: String,
    payment_status: String,
    is_active: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct LoginResponse {
    token: String,
    expires_at: String,
    business: BusinessProfile,
}

#[derive(Debug, Serialize)]
struct LoginRequest {
    email: String,
    password: String,
}

pub async fn run(cmd: Commands, config: &Config, format: Format) -> Result<()> {
    let client = ApiClient::new(config);

    match cmd {
        Commands::Register {
            name,
            owner,
            email,
            phone,
            password,
            business_type,
            description,
            address,
            city,
            country,
            website,
        } => {
            let req = RegisterRequest {
                business_name: name,
                owner_name: owner,
                email,
                phone,
                password,
                business_type,
                description,
                address,
                city,
                country,
                website,
            };
            let resp: RegisterResponse = client.post_no_auth("/api/auth/register", &req).await?;

            match format {
                Format::Json => output::print_json(&resp),
                Format::Table => {
                    output::print_success(&resp.message);
                    println!("Business ID: {}", resp.business_id);
                    println!();
                    println!("Log in to obtain an access token:");
                    println!("  musika business login --email <email> --password <password>");
                }
            }
        }
        Commands::Login { email, password } => {
            let req = LoginRequest { email, password };
            let resp: LoginResponse = client.post_no_auth("/api/auth/login", &req).await?;

            match format {
                Format::Json => output::print_json(&resp),
                Format::Table => {
                    output::print_success("Logged in");
                    output::print_single(resp.business);
                    println!();
                    println!("Token (valid until {}):", resp.expires_at);
                    println!("  {}", resp.token);
                    println!();
                    println!("To configure the CLI:");
                    println!("  musika config set --token {}", resp.token);
                }
            }
        }
    }

    Ok(())
}

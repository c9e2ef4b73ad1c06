use anyhow::{Context, Result};
use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub db_max_connections: u32,
    pub otlp_endpoint: Option<String>,
    pub rate_limit_per_minute: i32,
    /// Bearer token that gates the admin surface (payment verification,
    /// outbox inspection, admin chat).
    pub admin_token: String,
    /// Address that receives payment submission notices.
    pub admin_email: String,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub from_address: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL required")?,
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".into())
                .parse()?,
            otlp_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok(),
            rate_limit_per_minute: env::var("RATE_LIMIT_PER_MINUTE")
                .unwrap_or_else(|_| "100".into())
                .parse()?,
            admin_token: env::var("ADMIN_TOKEN").context("ADMIN_TOKEN required")?,
            admin_email: env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@musika.co.zw".into()),
            smtp_host: env::var("SMTP_HOST").ok(),
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".into())
                .parse()?,
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            from_address: env::var("SMTP_FROM")
                .unwrap_or_else(|_| "Musika <no-reply@musika.co.zw>".into()),
        })
    }
}

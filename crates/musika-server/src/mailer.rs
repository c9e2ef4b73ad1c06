use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::Config;

/// SMTP delivery channel for the notification dispatcher. When no relay is
/// configured the mailer only logs, which keeps local runs and the test
/// harness free of any SMTP dependency.
#[derive(Clone)]
pub enum Mailer {
    Smtp {
        transport: AsyncSmtpTransport<Tokio1Executor>,
        from: Mailbox,
    },
    LogOnly,
}

impl Mailer {
    pub fn from_config(config: &Config) -> Result<Self> {
        let Some(host) = &config.smtp_host else {
            return Ok(Self::LogOnly);
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .context("invalid SMTP host")?
            .port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from: Mailbox = config
            .from_address
            .parse()
            .context("invalid SMTP_FROM address")?;

        Ok(Self::Smtp {
            transport: builder.build(),
            from,
        })
    }

    pub async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<()> {
        match self {
            Self::Smtp { transport, from } => {
                let message = Message::builder()
                    .from(from.clone())
                    .to(recipient.parse().context("invalid recipient address")?)
                    .subject(subject)
                    .header(ContentType::TEXT_HTML)
                    .body(html_body.to_string())?;

                transport.send(message).await?;
                Ok(())
            }
            Self::LogOnly => {
                info!(recipient, subject, "smtp not configured, logging notification");
                Ok(())
            }
        }
    }
}

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::error;
use uuid::Uuid;

use crate::domain::NotificationOutbox;
use crate::mailer::Mailer;

/// Drains the notification outbox. Emails are enqueued inside the same
/// transaction as the state change they announce, so delivery here is
/// strictly after commit and a failure can only ever delay the notice.
pub struct EmailDispatcher {
    pool: PgPool,
    mailer: Mailer,
    handle: Option<JoinHandle<()>>,
}

impl EmailDispatcher {
    pub fn new(pool: PgPool, mailer: Mailer) -> Self {
        Self {
            pool,
            mailer,
            handle: None,
        }
    }

    pub fn start(&mut self) {
        let pool = self.pool.clone();
        let mailer = self.mailer.clone();

        let handle = tokio::spawn(async move {
            loop {
                if let Err(e) = process_batch(&pool, &mailer).await {
                    error!(error = %e, "notification dispatch error");
                }
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        });

        self.handle = Some(handle);
    }
}

async fn process_batch(pool: &PgPool, mailer: &Mailer) -> anyhow::Result<()> {
    let pending: Vec<NotificationOutbox> = sqlx::query_as(
        r#"
        SELECT * FROM notification_outbox
        WHERE status IN ('pending', 'retrying')
        AND next_attempt_at <= NOW()
        ORDER BY created_at
        LIMIT 50
        FOR UPDATE SKIP LOCKED
        "#,
    )
    .fetch_all(pool)
    .await?;

    for notification in pending {
        match mailer
            .send(
                &notification.recipient,
                &notification.subject,
                &notification.html_body,
            )
            .await
        {
            Ok(_) => mark_sent(pool, notification.id).await?,
            Err(e) => schedule_retry(pool, notification.id, &e.to_string()).await?,
        }
    }

    Ok(())
}

async fn mark_sent(pool: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("UPDATE notification_outbox SET status = 'sent', sent_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

async fn schedule_retry(pool: &PgPool, id: Uuid, error: &str) -> anyhow::Result<()> {
    let notification: Option<NotificationOutbox> =
        sqlx::query_as("SELECT * FROM notification_outbox WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    let notification = match notification {
        Some(n) => n,
        None => return Ok(()),
    };

    let next_attempt = notification.attempts + 1;

    if next_attempt >= notification.max_attempts {
        sqlx::query(
            "UPDATE notification_outbox SET status = 'failed', last_error = $1 WHERE id = $2",
        )
        .bind(error)
        .bind(id)
        .execute(pool)
        .await?;
    } else {
        let delay_secs = 2i64.pow(next_attempt as u32).min(3600);
        let next_attempt_at = Utc::now() + chrono::Duration::seconds(delay_secs);

        sqlx::query(
            "UPDATE notification_outbox SET status = 'retrying', attempts = $1, next_attempt_at = $2, last_error = $3 WHERE id = $4",
        )
        .bind(next_attempt)
        .bind(next_attempt_at)
        .bind(error)
        .bind(id)
        .execute(pool)
        .await?;
    }

    Ok(())
}

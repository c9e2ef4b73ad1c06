use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::NotificationOutbox;
use crate::error::{AppError, Result};
use crate::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    limit: i64,
    offset: Option<i64>,
    status: Option<String>,
}

fn default_limit() -> i64 {
    50
}

#[derive(Serialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub recipient: String,
    pub subject: String,
    pub status: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub next_attempt_at: DateTime<Utc>,
}

impl From<NotificationOutbox> for NotificationResponse {
    fn from(n: NotificationOutbox) -> Self {
        Self {
            id: n.id,
            recipient: n.recipient,
            subject: n.subject,
            status: n.status,
            attempts: n.attempts,
            max_attempts: n.max_attempts,
            last_error: n.last_error,
            created_at: n.created_at,
            sent_at: n.sent_at,
            next_attempt_at: n.next_attempt_at,
        }
    }
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<NotificationResponse>>> {
    let notifications: Vec<NotificationOutbox> = match &query.status {
        Some(status) => {
            sqlx::query_as(
                r#"
                SELECT * FROM notification_outbox
                WHERE status = $1
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(status)
            .bind(query.limit)
            .bind(query.offset.unwrap_or(0))
            .fetch_all(&state.db)
            .await?
        }
        None => {
            sqlx::query_as(
                "SELECT * FROM notification_outbox ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            )
            .bind(query.limit)
            .bind(query.offset.unwrap_or(0))
            .fetch_all(&state.db)
            .await?
        }
    };

    Ok(Json(
        notifications
            .into_iter()
            .map(NotificationResponse::from)
            .collect(),
    ))
}

pub async fn retry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationResponse>> {
    let notification: NotificationOutbox = sqlx::query_as(
        r#"
        UPDATE notification_outbox
        SET status = 'pending', attempts = 0, next_attempt_at = NOW(), last_error = NULL
        WHERE id = $1 AND status = 'failed'
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound(
        "Notification not found or not in failed status".into(),
    ))?;

    Ok(Json(NotificationResponse::from(notification)))
}

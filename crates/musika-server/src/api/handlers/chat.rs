use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

use crate::api::middleware::admin::ADMIN_ACTOR;
use crate::api::middleware::auth::AuthContext;
use crate::domain::{Business, ChatMessage, SendMessageRequest, SenderType};
use crate::error::{AppError, Result};
use crate::AppState;

pub async fn history(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<ChatMessage>>> {
    list_messages(&state, auth.business_id()).await.map(Json)
}

pub async fn send(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse> {
    let business = find_business(&state, auth.business_id()).await?;

    let message = persist_message(
        &state,
        business.id,
        &business.business_name,
        SenderType::Business,
        &req.message,
    )
    .await?;
    state.chat.publish(&message);

    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn admin_history(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
) -> Result<Json<Vec<ChatMessage>>> {
    // 404 for unknown businesses rather than an empty history
    find_business(&state, business_id).await?;
    list_messages(&state, business_id).await.map(Json)
}

pub async fn admin_send(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse> {
    find_business(&state, business_id).await?;

    let message =
        persist_message(&state, business_id, ADMIN_ACTOR, SenderType::Admin, &req.message).await?;
    state.chat.publish(&message);

    Ok((StatusCode::CREATED, Json(message)))
}

/// Live channel for a business: pushes every message published to its room
/// and persists messages received on the socket before broadcasting them.
pub async fn ws(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    ws: WebSocketUpgrade,
) -> Result<Response> {
    let business = find_business(&state, auth.business_id()).await?;
    Ok(ws.on_upgrade(move |socket| run_socket(state, business, socket)))
}

async fn run_socket(state: Arc<AppState>, business: Business, socket: WebSocket) {
    let mut room = state.chat.subscribe(business.id);
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            event = room.recv() => match event {
                Ok(message) => {
                    let Ok(text) = serde_json::to_string(&message) else { continue };
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let Ok(req) = serde_json::from_str::<SendMessageRequest>(&text) else {
                        continue;
                    };
                    match persist_message(
                        &state,
                        business.id,
                        &business.business_name,
                        SenderType::Business,
                        &req.message,
                    )
                    .await
                    {
                        Ok(message) => state.chat.publish(&message),
                        Err(e) => warn!(error = %e, "failed to persist chat message"),
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(_)) => break,
            },
        }
    }
}

async fn find_business(state: &AppState, business_id: Uuid) -> Result<Business> {
    sqlx::query_as("SELECT * FROM businesses WHERE id = $1")
        .bind(business_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::BusinessNotFound(business_id))
}

async fn list_messages(state: &AppState, business_id: Uuid) -> Result<Vec<ChatMessage>> {
    let messages: Vec<ChatMessage> = sqlx::query_as(
        "SELECT * FROM chat_messages WHERE business_id = $1 ORDER BY created_at, id",
    )
    .bind(business_id)
    .fetch_all(&state.db)
    .await?;

    Ok(messages)
}

async fn persist_message(
    state: &AppState,
    business_id: Uuid,
    sender: &str,
    sender_type: SenderType,
    body: &str,
) -> Result<ChatMessage> {
    if body.trim().is_empty() {
        return Err(AppError::Validation("message is required".into()));
    }

    let message: ChatMessage = sqlx::query_as(
        r#"
        INSERT INTO chat_messages (id, business_id, sender, sender_type, message, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(business_id)
    .bind(sender)
    .bind(sender_type)
    .bind(body)
    .bind(Utc::now())
    .fetch_one(&state.db)
    .await?;

    Ok(message)
}

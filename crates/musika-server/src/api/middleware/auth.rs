use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;

use crate::domain::AuthToken;
use crate::error::AppError;
use crate::AppState;

/// Identity resolved from a login-issued bearer token. The business id here
/// is authoritative; handlers never trust an id from the request body.
#[derive(Clone)]
pub struct AuthContext {
    pub token: AuthToken,
}

impl AuthContext {
    pub fn business_id(&self) -> uuid::Uuid {
        self.token.business_id
    }
}

pub async fn middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::InvalidToken)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::InvalidToken)?;

    if token.len() < 12 {
        return Err(AppError::InvalidToken);
    }
    let prefix = &token[..12];

    let record: AuthToken = sqlx::query_as(
        "SELECT * FROM auth_tokens WHERE token_prefix = $1 AND revoked_at IS NULL",
    )
    .bind(prefix)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::InvalidToken)?;

    if !record.is_valid() || !record.verify(token) {
        return Err(AppError::InvalidToken);
    }

    sqlx::query("UPDATE auth_tokens SET last_used_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(record.id)
        .execute(&state.db)
        .await?;

    req.extensions_mut().insert(AuthContext { token: record });

    Ok(next.run(req).await)
}

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::AppError;
use crate::AppState;

/// Name recorded as `verified_by` on payments decided through this gate.
pub const ADMIN_ACTOR: &str = "Admin";

pub async fn middleware(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::AdminRequired)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::AdminRequired)?;

    if !constant_time_eq(token.as_bytes(), state.config.admin_token.as_bytes()) {
        return Err(AppError::AdminRequired);
    }

    Ok(next.run(req).await)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers::{auth, chat, health, notifications, payments};
use crate::api::middleware::{admin, auth as auth_mw, rate_limit};
use crate::AppState;

async fn fallback() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": {
                "code": "not_found",
                "message": "The requested endpoint does not exist"
            }
        })),
    )
}

pub fn build(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/payments/submit", post(payments::submit))
        .route("/payments/status", get(payments::status))
        .route("/chat/messages", get(chat::history).post(chat::send))
        .route("/chat/ws", get(chat::ws))
        .layer(from_fn_with_state(state.clone(), rate_limit::middleware))
        .layer(from_fn_with_state(state.clone(), auth_mw::middleware));

    let admin_only = Router::new()
        .route("/payments/verify/:payment_id", post(payments::verify))
        .route("/admin/payments", get(payments::admin_list))
        .route(
            "/admin/chat/:business_id",
            get(chat::admin_history).post(chat::admin_send),
        )
        .route("/admin/notifications", get(notifications::list))
        .route("/admin/notifications/:id/retry", post(notifications::retry))
        .layer(from_fn_with_state(state.clone(), admin::middleware));

    let public = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login));

    let api = Router::new()
        .nest("/api", protected.merge(admin_only))
        .merge(public)
        .fallback(fallback);

    api.with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive()),
        )
}

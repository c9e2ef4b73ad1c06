use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("transaction id already used: {transaction_id}")]
    DuplicateTransaction { transaction_id: String },

    #[error("business {business_id} already has a payment awaiting verification")]
    PendingPaymentExists { business_id: Uuid },

    #[error("payment already decided: {0}")]
    AlreadyDecided(Uuid),

    #[error("payment not found: {0}")]
    PaymentNotFound(Uuid),

    #[error("business not found: {0}")]
    BusinessNotFound(Uuid),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid auth token")]
    InvalidToken,

    #[error("admin credential required")]
    AdminRequired,

    #[error("rate limit exceeded")]
    RateLimitExceeded,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, details) = match &self {
            Self::DuplicateTransaction { transaction_id } => (
                StatusCode::CONFLICT,
                "duplicate_transaction",
                Some(serde_json::json!({ "transaction_id": transaction_id })),
            ),
            Self::PendingPaymentExists { .. } => {
                (StatusCode::CONFLICT, "pending_payment_exists", None)
            }
            Self::AlreadyDecided(_) => (StatusCode::CONFLICT, "payment_already_decided", None),
            Self::PaymentNotFound(_) => (StatusCode::NOT_FOUND, "payment_not_found", None),
            Self::BusinessNotFound(_) => (StatusCode::NOT_FOUND, "business_not_found", None),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", None),
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials", None),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            Self::AdminRequired => (StatusCode::UNAUTHORIZED, "admin_required", None),
            Self::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded", None),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error", None),
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None),
            Self::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "serialization_error", None),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message: self.to_string(),
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

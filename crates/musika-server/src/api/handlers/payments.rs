use std::sync::Arc;

use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::middleware::admin::ADMIN_ACTOR;
use crate::api::middleware::auth::AuthContext;
use crate::domain::{
    flat_fee, ActivationSummary, Business, Notification, Payment, PaymentResponse, PaymentState,
    SubmitPaymentRequest, VerificationOutcome, VerifyPaymentRequest, SUBSCRIPTION_DAYS,
};
use crate::error::{AppError, Result};
use crate::AppState;

#[derive(Serialize)]
pub struct SubmitPaymentResponse {
    pub payment_id: Uuid,
    pub message: String,
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SubmitPaymentRequest>,
) -> Result<impl IntoResponse> {
    let business_id = auth.business_id();

    if req.phone_number.trim().is_empty() {
        return Err(AppError::Validation("phone_number is required".into()));
    }
    if req.transaction_id.trim().is_empty() {
        return Err(AppError::Validation("transaction_id is required".into()));
    }

    let business: Business = sqlx::query_as("SELECT * FROM businesses WHERE id = $1")
        .bind(business_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::BusinessNotFound(business_id))?;

    // Fast-path duplicate check; the unique index on transaction_id is the
    // authoritative guard for the concurrent case.
    let existing: Option<Payment> =
        sqlx::query_as("SELECT * FROM payments WHERE transaction_id = $1")
            .bind(&req.transaction_id)
            .fetch_optional(&state.db)
            .await?;
    if existing.is_some() {
        return Err(AppError::DuplicateTransaction {
            transaction_id: req.transaction_id,
        });
    }

    let mut tx = state.db.begin().await?;
    let now = Utc::now();
    let payment_id = Uuid::new_v4();

    let insert = sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (id, business_id, amount, currency, payment_method, phone_number, transaction_id, status, subscription_months, notes, created_at)
        VALUES ($1, $2, $3, 'USD', $4, $5, $6, 'pending', 1, $7, $8)
        RETURNING *
        "#,
    )
    .bind(payment_id)
    .bind(business_id)
    .bind(flat_fee())
    .bind(req.payment_method)
    .bind(&req.phone_number)
    .bind(&req.transaction_id)
    .bind(&req.notes)
    .bind(now)
    .fetch_one(&mut *tx)
    .await;

    let payment = match insert {
        Ok(p) => p,
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            // Two constraints can fire here: the global transaction_id guard
            // and the one-pending-payment-per-business guard.
            return Err(match e.constraint() {
                Some("payments_pending_business_key") => {
                    AppError::PendingPaymentExists { business_id }
                }
                _ => AppError::DuplicateTransaction {
                    transaction_id: req.transaction_id,
                },
            });
        }
        Err(e) => return Err(e.into()),
    };

    let notice = Notification::payment_submitted(&state.config.admin_email, &business, &payment);
    enqueue_notification(&mut tx, &notice).await?;

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitPaymentResponse {
            payment_id: payment.id,
            message: "Payment submitted successfully. We will verify and activate your account within 24 hours.".into(),
        }),
    ))
}

#[derive(Serialize)]
pub struct PaymentStatusResponse {
    pub payment: Option<PaymentResponse>,
    pub business: ActivationSummary,
}

pub async fn status(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<PaymentStatusResponse>> {
    let business_id = auth.business_id();

    let business: Business = sqlx::query_as("SELECT * FROM businesses WHERE id = $1")
        .bind(business_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::BusinessNotFound(business_id))?;

    let payment: Option<Payment> = sqlx::query_as(
        "SELECT * FROM payments WHERE business_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .bind(business_id)
    .fetch_optional(&state.db)
    .await?;

    Ok(Json(PaymentStatusResponse {
        payment: payment.map(PaymentResponse::from),
        business: ActivationSummary::from(&business),
    }))
}

#[derive(Serialize)]
pub struct VerifyPaymentResponse {
    pub message: String,
}

/// Records an admin decision against a pending payment and cascades the
/// business activation state. Payment, business and the outcome notification
/// commit as one transaction; the row locks also serialize concurrent
/// decisions touching the same business.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Path(payment_id): Path<Uuid>,
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>> {
    let now = Utc::now();
    let mut tx = state.db.begin().await?;

    let payment: Payment = sqlx::query_as("SELECT * FROM payments WHERE id = $1 FOR UPDATE")
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::PaymentNotFound(payment_id))?;

    if payment.status != PaymentState::Pending {
        return Err(AppError::AlreadyDecided(payment_id));
    }

    let business: Business = sqlx::query_as("SELECT * FROM businesses WHERE id = $1 FOR UPDATE")
        .bind(payment.business_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::BusinessNotFound(payment.business_id))?;

    let new_state = match req.outcome {
        VerificationOutcome::Verified => PaymentState::Verified,
        VerificationOutcome::Rejected => PaymentState::Rejected,
    };

    sqlx::query(
        "UPDATE payments SET status = $1, verified_by = $2, verification_date = $3, notes = $4 WHERE id = $5",
    )
    .bind(new_state)
    .bind(ADMIN_ACTOR)
    .bind(now)
    .bind(&req.notes)
    .bind(payment_id)
    .execute(&mut *tx)
    .await?;

    let notice = match req.outcome {
        VerificationOutcome::Verified => {
            let expiry = now + Duration::days(SUBSCRIPTION_DAYS);
            sqlx::query(
                r#"
                UPDATE businesses
                SET payment_status = 'verified', is_active = TRUE, subscription_expiry = $1, updated_at = $2
                WHERE id = $3
                "#,
            )
            .bind(expiry)
            .bind(now)
            .bind(business.id)
            .execute(&mut *tx)
            .await?;

            Notification::payment_verified(&business, expiry, req.notes.as_deref())
        }
        VerificationOutcome::Rejected => {
            // subscription_expiry deliberately untouched; a rejection must
            // not shorten a window granted by an earlier verification.
            sqlx::query(
                r#"
                UPDATE businesses
                SET payment_status = 'pending', is_active = FALSE, updated_at = $1
                WHERE id = $2
                "#,
            )
            .bind(now)
            .bind(business.id)
            .execute(&mut *tx)
            .await?;

            Notification::payment_rejected(&business, req.notes.as_deref())
        }
    };

    enqueue_notification(&mut tx, &notice).await?;

    tx.commit().await?;

    let outcome = match req.outcome {
        VerificationOutcome::Verified => "verified",
        VerificationOutcome::Rejected => "rejected",
    };

    Ok(Json(VerifyPaymentResponse {
        message: format!("Payment {} successfully", outcome),
    }))
}

#[derive(Deserialize)]
pub struct AdminListQuery {
    #[serde(default = "default_limit")]
    limit: i64,
    offset: Option<i64>,
    status: Option<PaymentState>,
}

fn default_limit() -> i64 {
    50
}

pub async fn admin_list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<Vec<PaymentResponse>>> {
    let payments: Vec<Payment> = match query.status {
        Some(status) => {
            sqlx::query_as(
                "SELECT * FROM payments WHERE status = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            )
            .bind(status)
            .bind(query.limit)
            .bind(query.offset.unwrap_or(0))
            .fetch_all(&state.db)
            .await?
        }
        None => {
            sqlx::query_as("SELECT * FROM payments ORDER BY created_at DESC LIMIT $1 OFFSET $2")
                .bind(query.limit)
                .bind(query.offset.unwrap_or(0))
                .fetch_all(&state.db)
                .await?
        }
    };

    Ok(Json(payments.into_iter().map(PaymentResponse::from).collect()))
}

async fn enqueue_notification(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    notice: &Notification,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO notification_outbox (id, recipient, subject, html_body, status, attempts, max_attempts, next_attempt_at, created_at)
        VALUES ($1, $2, $3, $4, 'pending', 0, 5, NOW(), NOW())
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&notice.recipient)
    .bind(&notice.subject)
    .bind(&notice.html_body)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

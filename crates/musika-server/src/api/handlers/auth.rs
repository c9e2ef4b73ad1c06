use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    hash_password, verify_password, AuthToken, Business, BusinessProfile, LoginRequest,
    RegisterBusinessRequest,
};
use crate::error::{AppError, Result};
use crate::AppState;

#[derive(Serialize)]
pub struct RegisterResponse {
    pub business_id: Uuid,
    pub message: String,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterBusinessRequest>,
) -> Result<impl IntoResponse> {
    for (value, field) in [
        (&req.business_name, "business_name"),
        (&req.owner_name, "owner_name"),
        (&req.phone, "phone"),
        (&req.description, "description"),
        (&req.address, "address"),
        (&req.city, "city"),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{} is required", field)));
        }
    }

    let email = req.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::Validation("valid email is required".into()));
    }
    if req.password.len() < 6 {
        return Err(AppError::Validation(
            "password must be at least 6 characters".into(),
        ));
    }

    let password_hash = hash_password(&req.password);
    let id = Uuid::new_v4();
    let now = Utc::now();

    let insert = sqlx::query_as::<_, Business>(
        r#"
        INSERT INTO businesses (id, business_name, owner_name, email, phone, password_hash, business_type, description, address, city, country, website, payment_status, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'pending', FALSE, $13, $13)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&req.business_name)
    .bind(&req.owner_name)
    .bind(&email)
    .bind(&req.phone)
    .bind(&password_hash)
    .bind(req.business_type)
    .bind(&req.description)
    .bind(&req.address)
    .bind(&req.city)
    .bind(&req.country)
    .bind(&req.website)
    .bind(now)
    .fetch_one(&state.db)
    .await;

    let business = match insert {
        Ok(b) => b,
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(AppError::Validation(
                "business with this email already exists".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            business_id: business.id,
            message:
                "Business registered successfully. Please make payment to activate your account."
                    .into(),
        }),
    ))
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub business: BusinessProfile,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let email = req.email.trim().to_lowercase();

    let business: Business = sqlx::query_as("SELECT * FROM businesses WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&req.password, &business.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    let (record, issued) = AuthToken::issue(business.id);

    sqlx::query(
        r#"
        INSERT INTO auth_tokens (id, business_id, token_hash, token_prefix, created_at, expires_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(record.id)
    .bind(record.business_id)
    .bind(&record.token_hash)
    .bind(&record.token_prefix)
    .bind(record.created_at)
    .bind(record.expires_at)
    .execute(&state.db)
    .await?;

    Ok(Json(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        business: BusinessProfile::from(business),
    }))
}

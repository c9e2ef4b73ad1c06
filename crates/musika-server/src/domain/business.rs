use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Verified,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BusinessType {
    Retail,
    Wholesale,
    Service,
    Manufacturing,
    Technology,
    Food,
    Fashion,
    Other,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Business {
    pub id: Uuid,
    pub business_name: String,
    pub owner_name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip)]
    pub password_hash: String,
    pub business_type: BusinessType,
    pub description: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub website: Option<String>,
    pub payment_status: PaymentStatus,
    pub is_active: bool,
    pub subscription_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterBusinessRequest {
    pub business_name: String,
    pub owner_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub business_type: BusinessType,
    pub description: String,
    pub address: String,
    pub city: String,
    #[serde(default = "default_country")]
    pub country: String,
    pub website: Option<String>,
}

fn default_country() -> String {
    "Zimbabwe".into()
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct BusinessProfile {
    pub id: Uuid,
    pub business_name: String,
    pub email: String,
    pub payment_status: PaymentStatus,
    pub is_active: bool,
}

impl From<Business> for BusinessProfile {
    fn from(b: Business) -> Self {
        Self {
            id: b.id,
            business_name: b.business_name,
            email: b.email,
            payment_status: b.payment_status,
            is_active: b.is_active,
        }
    }
}

/// Activation fields exposed by the payment status endpoint.
#[derive(Debug, Serialize)]
pub struct ActivationSummary {
    pub payment_status: PaymentStatus,
    pub is_active: bool,
    pub subscription_expiry: Option<DateTime<Utc>>,
}

impl From<&Business> for ActivationSummary {
    fn from(b: &Business) -> Self {
        Self {
            payment_status: b.payment_status,
            is_active: b.is_active,
            subscription_expiry: b.subscription_expiry,
        }
    }
}

pub fn hash_password(password: &str) -> String {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .expect("failed to hash")
        .to_string()
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Flat subscription fee in USD charged for every submission.
pub fn flat_fee() -> Decimal {
    Decimal::new(2, 0)
}

/// Length of the subscription window granted on verification. Fixed at 30
/// days; the payment's `subscription_months` field is intentionally not
/// consulted.
pub const SUBSCRIPTION_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Ecocash,
    Onemoney,
    Telecash,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ecocash => "ecocash",
            Self::Onemoney => "onemoney",
            Self::Telecash => "telecash",
            Self::BankTransfer => "bank_transfer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Pending,
    Verified,
    Rejected,
}

/// Decision an admin records against a pending payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationOutcome {
    Verified,
    Rejected,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub business_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub phone_number: String,
    pub transaction_id: String,
    pub status: PaymentState,
    pub verified_by: Option<String>,
    pub verification_date: Option<DateTime<Utc>>,
    pub subscription_months: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitPaymentRequest {
    pub phone_number: String,
    pub transaction_id: String,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub outcome: VerificationOutcome,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub business_id: Uuid,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub phone_number: String,
    pub transaction_id: String,
    pub status: PaymentState,
    pub verified_by: Option<String>,
    pub verification_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id,
            business_id: p.business_id,
            amount: p.amount,
            currency: p.currency,
            payment_method: p.payment_method,
            phone_number: p.phone_number,
            transaction_id: p.transaction_id,
            status: p.status,
            verified_by: p.verified_by,
            verification_date: p.verification_date,
            notes: p.notes,
            created_at: p.created_at,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Business, Payment};

/// A queued email. Rows are written in the same transaction as the state
/// change they announce and drained by the background dispatcher, so a
/// delivery failure can never mask or revert a committed transition.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationOutbox {
    pub id: Uuid,
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
    pub status: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub next_attempt_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

/// A composed email ready to be enqueued.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
}

impl Notification {
    /// Admin notice raised when a business submits a payment claim.
    pub fn payment_submitted(admin_email: &str, business: &Business, payment: &Payment) -> Self {
        let notes = payment.notes.as_deref().unwrap_or("None");
        let html_body = format!(
            "<h2>New Payment Submission</h2>\
             <p><strong>Business:</strong> {}</p>\
             <p><strong>Owner:</strong> {}</p>\
             <p><strong>Email:</strong> {}</p>\
             <p><strong>Phone:</strong> {}</p>\
             <p><strong>Payment Method:</strong> {}</p>\
             <p><strong>Transaction ID:</strong> {}</p>\
             <p><strong>Amount:</strong> ${} {}</p>\
             <p><strong>Notes:</strong> {}</p>\
             <p>Please verify this payment and activate the business account.</p>",
            business.business_name,
            business.owner_name,
            business.email,
            payment.phone_number,
            payment.payment_method.as_str(),
            payment.transaction_id,
            payment.amount,
            payment.currency,
            notes,
        );

        Self {
            recipient: admin_email.to_string(),
            subject: "New Payment Submission - Musika".to_string(),
            html_body,
        }
    }

    /// Confirmation sent to the business after a successful verification.
    pub fn payment_verified(business: &Business, expiry: DateTime<Utc>, notes: Option<&str>) -> Self {
        let html_body = format!(
            "<h2>Payment Verified</h2>\
             <p>Dear {},</p>\
             <p>Your payment has been verified and your account is now active! \
             You can now start advertising your products on our platform.</p>\
             <p><strong>Subscription expires:</strong> {}</p>\
             <p><strong>Notes:</strong> {}</p>\
             <p>Best regards,<br>The Musika Team</p>",
            business.owner_name,
            expiry.format("%a %b %e %Y"),
            notes.unwrap_or("None"),
        );

        Self {
            recipient: business.email.clone(),
            subject: "Payment Verified - Musika".to_string(),
            html_body,
        }
    }

    /// Notice sent to the business after a rejection.
    pub fn payment_rejected(business: &Business, notes: Option<&str>) -> Self {
        let html_body = format!(
            "<h2>Payment Rejected</h2>\
             <p>Dear {},</p>\
             <p>Unfortunately, we could not verify your payment. \
             Please contact us for assistance.</p>\
             <p><strong>Notes:</strong> {}</p>\
             <p>Best regards,<br>The Musika Team</p>",
            business.owner_name,
            notes.unwrap_or("None"),
        );

        Self {
            recipient: business.email.clone(),
            subject: "Payment Rejected - Musika".to_string(),
            html_body,
        }
    }
}

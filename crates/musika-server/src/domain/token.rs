use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::Serialize;
use uuid::Uuid;

const TOKEN_TTL_DAYS: i64 = 7;

/// A login-issued bearer credential. Only the argon2 hash is stored; the
/// plaintext prefix allows lookup without a full scan.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthToken {
    pub id: Uuid,
    pub business_id: Uuid,
    pub token_hash: String,
    pub token_prefix: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct IssuedToken {
    pub id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthToken {
    pub fn issue(business_id: Uuid) -> (Self, IssuedToken) {
        let mut token_bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut token_bytes);

        let token = format!("msk_{}", URL_SAFE_NO_PAD.encode(token_bytes));
        let prefix = token[..12].to_string();

        let salt = SaltString::generate(&mut rand::thread_rng());
        let token_hash = Argon2::default()
            .hash_password(token.as_bytes(), &salt)
            .expect("failed to hash")
            .to_string();

        let id = Uuid::new_v4();
        let now = Utc::now();
        let expires_at = now + Duration::days(TOKEN_TTL_DAYS);

        let record = Self {
            id,
            business_id,
            token_hash,
            token_prefix: prefix,
            created_at: now,
            expires_at,
            revoked_at: None,
            last_used_at: None,
        };

        let issued = IssuedToken {
            id,
            token,
            expires_at,
        };

        (record, issued)
    }

    pub fn verify(&self, token: &str) -> bool {
        let parsed = match PasswordHash::new(&self.token_hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(token.as_bytes(), &parsed)
            .is_ok()
    }

    pub fn is_valid(&self) -> bool {
        self.revoked_at.is_none() && self.expires_at > Utc::now()
    }
}

//! Data models for the customer auth service

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use validator::Validate;

/// Authenticated subject id (customer or staff member)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct IdentityId(pub i64);

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stored credential row: the identity and its bcrypt hash
#[derive(Clone, sqlx::FromRow)]
pub struct StoredCredential {
    pub id: IdentityId,
    pub password_hash: String,
}

// Keep hashes out of debug output.
impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredential")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Persisted session token, keyed by the digest of the bearer value
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TokenRecord {
    pub token_digest: String,
    pub customer_id: IdentityId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Token handed back to the caller after a successful login
#[derive(Clone)]
pub struct IssuedToken {
    pub token: String,
    pub customer_id: IdentityId,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("customer_id", &self.customer_id)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Customer login body; `login` carries the phone number
#[derive(Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1, message = "login must not be empty"))]
    pub login: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize, Validate)]
pub struct ValidateTokenRequest {
    #[validate(length(min = 1, message = "token must not be empty"))]
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CustomerIdentity {
    pub customer_id: IdentityId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PurgeResponse {
    pub purged: u64,
}

//! Credential and token persistence
//!
//! The auth core reads credentials and appends/reads token rows through the
//! two traits below. `PgStore` backs them with Postgres; `MemoryStore` keeps
//! everything in process for tests and local runs.

mod memory;
mod postgres;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{StoredCredential, TokenRecord};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("token digest already present")]
    DuplicateToken,

    #[error("store call exceeded {0:?}")]
    Timeout(Duration),
}

/// Read-only lookup of stored password hashes
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Customer credential by phone number
    async fn lookup_customer(&self, phone: &str) -> Result<Option<StoredCredential>, StoreError>;

    /// Staff credential by login
    async fn lookup_staff(&self, login: &str) -> Result<Option<StoredCredential>, StoreError>;
}

/// Append-only token table plus expiry housekeeping
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Must fail with `StoreError::DuplicateToken` if the digest already exists.
    async fn insert_token(&self, record: &TokenRecord) -> Result<(), StoreError>;

    async fn lookup_token(&self, token_digest: &str) -> Result<Option<TokenRecord>, StoreError>;

    /// Delete tokens with `expires_at <= now`, returning how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Run a store call under a deadline.
pub async fn with_deadline<T, F>(deadline: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(deadline)),
    }
}

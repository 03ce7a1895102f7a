use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{CredentialStore, StoreError, TokenStore};
use crate::models::{StoredCredential, TokenRecord};

/// Postgres `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";

/// Postgres-backed store over the `customers`, `managers` and
/// `customers_tokens` tables
#[derive(Clone)]
pub struct PgStore {
    db_pool: PgPool,
}

impl PgStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn lookup_customer(&self, phone: &str) -> Result<Option<StoredCredential>, StoreError> {
        let credential = sqlx::query_as::<_, StoredCredential>(
            "SELECT id, password AS password_hash FROM customers WHERE phone = $1",
        )
        .bind(phone)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(credential)
    }

    async fn lookup_staff(&self, login: &str) -> Result<Option<StoredCredential>, StoreError> {
        let credential = sqlx::query_as::<_, StoredCredential>(
            "SELECT id, password AS password_hash FROM managers WHERE login = $1",
        )
        .bind(login)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(credential)
    }
}

#[async_trait]
impl TokenStore for PgStore {
    async fn insert_token(&self, record: &TokenRecord) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO customers_tokens (token_digest, customer_id, issued_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&record.token_digest)
        .bind(record.customer_id)
        .bind(record.issued_at)
        .bind(record.expires_at)
        .execute(&self.db_pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                Err(StoreError::DuplicateToken)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn lookup_token(&self, token_digest: &str) -> Result<Option<TokenRecord>, StoreError> {
        let record = sqlx::query_as::<_, TokenRecord>(
            r#"
            SELECT token_digest, customer_id, issued_at, expires_at
            FROM customers_tokens
            WHERE token_digest = $1
            "#,
        )
        .bind(token_digest)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(record)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM customers_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.db_pool)
            .await?;

        Ok(result.rows_affected())
    }
}

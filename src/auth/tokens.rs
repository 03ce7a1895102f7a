use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::models::{IdentityId, IssuedToken, TokenRecord};
use crate::store::{with_deadline, TokenStore};

/// Hex SHA-256 of a bearer token; the key tokens are stored under.
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Mints session tokens and persists them with a fixed expiry
pub struct TokenIssuer {
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    token_bytes: usize,
    store_timeout: StdDuration,
}

impl TokenIssuer {
    pub fn new(store: Arc<dyn TokenStore>, clock: Arc<dyn Clock>, config: &AuthConfig) -> Self {
        Self {
            store,
            clock,
            ttl: config.token_ttl,
            token_bytes: config.token_bytes,
            store_timeout: config.store_timeout,
        }
    }

    /// Issue a token for `customer_id`. The token is only returned once the
    /// row is stored; a failed insert is not retried.
    pub async fn issue_token(&self, customer_id: IdentityId) -> Result<IssuedToken, AuthError> {
        let mut entropy = vec![0u8; self.token_bytes];
        OsRng.try_fill_bytes(&mut entropy).map_err(|e| {
            error!(error = %e, "OS random source failed");
            AuthError::Internal(format!("token entropy unavailable: {}", e))
        })?;
        let token = hex::encode(&entropy);

        let issued_at = self.clock.now();
        let expires_at = issued_at.checked_add_signed(self.ttl).ok_or_else(|| {
            error!(ttl_secs = self.ttl.num_seconds(), "token expiry overflows the calendar");
            AuthError::Internal("token expiry out of range".to_string())
        })?;
        let record = TokenRecord {
            token_digest: token_digest(&token),
            customer_id,
            issued_at,
            expires_at,
        };

        with_deadline(self.store_timeout, self.store.insert_token(&record))
            .await
            .map_err(|err| {
                warn!(customer_id = %customer_id, error = %err, "failed to persist session token");
                AuthError::from(err)
            })?;

        info!(customer_id = %customer_id, expires_at = %record.expires_at, "session token issued");

        Ok(IssuedToken {
            token,
            customer_id,
            expires_at: record.expires_at,
        })
    }
}

/// Maps a presented token back to its customer, rejecting unknown or
/// expired tokens. Read-only.
pub struct TokenResolver {
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    store_timeout: StdDuration,
}

impl TokenResolver {
    pub fn new(store: Arc<dyn TokenStore>, clock: Arc<dyn Clock>, config: &AuthConfig) -> Self {
        Self {
            store,
            clock,
            store_timeout: config.store_timeout,
        }
    }

    pub async fn resolve(&self, token: &str) -> Result<IdentityId, AuthError> {
        if token.is_empty() {
            return Err(AuthError::NoSuchToken);
        }

        let record = with_deadline(self.store_timeout, self.store.lookup_token(&token_digest(token)))
            .await?
            .ok_or(AuthError::NoSuchToken)?;

        // Expired at the boundary instant.
        if self.clock.now() >= record.expires_at {
            debug!(customer_id = %record.customer_id, expires_at = %record.expires_at, "token expired");
            return Err(AuthError::TokenExpired);
        }

        Ok(record.customer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::{MemoryStore, StoreError};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    struct RejectingStore;

    #[async_trait]
    impl TokenStore for RejectingStore {
        async fn insert_token(&self, _record: &TokenRecord) -> Result<(), StoreError> {
            Err(StoreError::DuplicateToken)
        }

        async fn lookup_token(&self, _digest: &str) -> Result<Option<TokenRecord>, StoreError> {
            Ok(None)
        }

        async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<u64, StoreError> {
            Ok(0)
        }
    }

    struct StallingStore;

    #[async_trait]
    impl TokenStore for StallingStore {
        async fn insert_token(&self, _record: &TokenRecord) -> Result<(), StoreError> {
            Ok(())
        }

        async fn lookup_token(&self, _digest: &str) -> Result<Option<TokenRecord>, StoreError> {
            tokio::time::sleep(StdDuration::from_secs(5)).await;
            Ok(None)
        }

        async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<u64, StoreError> {
            Ok(0)
        }
    }

    fn pair(ttl: Duration) -> (TokenIssuer, TokenResolver, Arc<ManualClock>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let config = AuthConfig {
            token_ttl: ttl,
            ..AuthConfig::default()
        };
        (
            TokenIssuer::new(store.clone(), clock.clone(), &config),
            TokenResolver::new(store.clone(), clock.clone(), &config),
            clock,
            store,
        )
    }

    #[tokio::test]
    async fn issued_token_is_hex_and_stored_by_digest() {
        let (issuer, _, _, store) = pair(Duration::hours(24));
        let issued = issuer.issue_token(IdentityId(7)).await.unwrap();

        assert_eq!(issued.token.len(), 2 * crate::config::auth::DEFAULT_TOKEN_BYTES);
        assert!(issued.token.chars().all(|c| c.is_ascii_hexdigit()));

        let stored = store.lookup_token(&token_digest(&issued.token)).await.unwrap().unwrap();
        assert_eq!(stored.customer_id, IdentityId(7));
        assert_eq!(stored.expires_at, issued.expires_at);
        assert!(store.lookup_token(&issued.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expiry_boundary_is_inclusive() {
        let ttl = Duration::minutes(30);
        let (issuer, resolver, clock, _) = pair(ttl);
        let issued = issuer.issue_token(IdentityId(1)).await.unwrap();

        clock.advance(ttl - Duration::seconds(1));
        assert_eq!(resolver.resolve(&issued.token).await.unwrap(), IdentityId(1));

        clock.advance(Duration::seconds(1));
        assert!(matches!(
            resolver.resolve(&issued.token).await,
            Err(AuthError::TokenExpired)
        ));
    }

    #[tokio::test]
    async fn unknown_and_empty_tokens_are_not_found() {
        let (_, resolver, _, _) = pair(Duration::hours(1));
        assert!(matches!(resolver.resolve("deadbeef").await, Err(AuthError::NoSuchToken)));
        assert!(matches!(resolver.resolve("").await, Err(AuthError::NoSuchToken)));
    }

    #[tokio::test]
    async fn resolution_does_not_extend_expiry() {
        let ttl = Duration::minutes(10);
        let (issuer, resolver, clock, _) = pair(ttl);
        let issued = issuer.issue_token(IdentityId(3)).await.unwrap();

        for _ in 0..5 {
            clock.advance(Duration::minutes(1));
            resolver.resolve(&issued.token).await.unwrap();
        }
        clock.advance(Duration::minutes(5));
        assert!(matches!(
            resolver.resolve(&issued.token).await,
            Err(AuthError::TokenExpired)
        ));
    }

    #[tokio::test]
    async fn failed_insert_returns_no_token() {
        let config = AuthConfig::default();
        let issuer = TokenIssuer::new(
            Arc::new(RejectingStore),
            Arc::new(ManualClock::new(Utc::now())),
            &config,
        );

        assert!(matches!(
            issuer.issue_token(IdentityId(1)).await,
            Err(AuthError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn expiry_past_the_calendar_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(DateTime::<Utc>::MAX_UTC - Duration::seconds(1)));
        let issuer = TokenIssuer::new(store.clone(), clock, &AuthConfig::default());

        assert!(matches!(
            issuer.issue_token(IdentityId(1)).await,
            Err(AuthError::Internal(_))
        ));
        assert_eq!(store.token_count().await, 0);
    }

    #[tokio::test]
    async fn stalled_lookup_is_internal() {
        let config = AuthConfig {
            store_timeout: StdDuration::from_millis(20),
            ..AuthConfig::default()
        };
        let resolver = TokenResolver::new(
            Arc::new(StallingStore),
            Arc::new(ManualClock::new(Utc::now())),
            &config,
        );

        assert!(matches!(
            resolver.resolve("deadbeef").await,
            Err(AuthError::Internal(_))
        ));
    }
}

use std::sync::Arc;

use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::models::{IdentityId, IssuedToken};
use crate::store::{CredentialStore, TokenStore};

use super::credentials::CredentialVerifier;
use super::tokens::{TokenIssuer, TokenResolver};

/// Entry point used by the HTTP layer: customer login, token
/// authentication and the staff Basic-auth check.
pub struct AuthService {
    verifier: CredentialVerifier,
    issuer: TokenIssuer,
    resolver: TokenResolver,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        tokens: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
        config: &AuthConfig,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            verifier: CredentialVerifier::new(credentials, config)?,
            issuer: TokenIssuer::new(tokens.clone(), clock.clone(), config),
            resolver: TokenResolver::new(tokens, clock, config),
        })
    }

    /// Verify a customer's phone/password and issue a session token.
    pub async fn login(&self, phone: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let customer_id = self.verifier.verify_customer_credentials(phone, password).await?;
        self.issuer.issue_token(customer_id).await
    }

    /// Resolve a bearer token to the customer it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<IdentityId, AuthError> {
        self.resolver.resolve(token).await
    }

    pub async fn verify_staff(&self, login: &str, password: &str) -> bool {
        self.verifier.verify_staff_credentials(login, password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use chrono::{Duration, Utc};

    async fn service() -> (AuthService, Arc<ManualClock>, IdentityId) {
        let store = Arc::new(MemoryStore::new());
        let id = store
            .add_customer("555-0100", hash_password("secret", 4).unwrap())
            .await;
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let config = AuthConfig {
            bcrypt_cost: 4,
            ..AuthConfig::default()
        };
        let service = AuthService::new(store.clone(), store, clock.clone(), &config).unwrap();
        (service, clock, id)
    }

    #[tokio::test]
    async fn login_then_authenticate_until_ttl_passes() {
        let (service, clock, id) = service().await;

        let issued = service.login("555-0100", "secret").await.unwrap();
        assert_eq!(issued.customer_id, id);
        assert_eq!(service.authenticate(&issued.token).await.unwrap(), id);

        clock.advance(AuthConfig::default().token_ttl + Duration::seconds(1));
        assert!(matches!(
            service.authenticate(&issued.token).await,
            Err(AuthError::TokenExpired)
        ));
    }

    #[tokio::test]
    async fn repeated_logins_yield_distinct_live_tokens() {
        let (service, clock, id) = service().await;

        let first = service.login("555-0100", "secret").await.unwrap();
        clock.advance(Duration::hours(1));
        let second = service.login("555-0100", "secret").await.unwrap();

        assert_ne!(first.token, second.token);
        assert_eq!(service.authenticate(&first.token).await.unwrap(), id);
        assert_eq!(service.authenticate(&second.token).await.unwrap(), id);

        // first expires an hour before second
        clock.advance(Duration::hours(23));
        assert!(matches!(
            service.authenticate(&first.token).await,
            Err(AuthError::TokenExpired)
        ));
        assert_eq!(service.authenticate(&second.token).await.unwrap(), id);
    }

    #[tokio::test]
    async fn failed_login_issues_nothing() {
        let (service, _, _) = service().await;

        assert!(matches!(
            service.login("555-0199", "secret").await,
            Err(AuthError::NoSuchIdentity)
        ));
        assert!(matches!(
            service.login("555-0100", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn concurrent_resolution_is_stable() {
        let (service, _, id) = service().await;
        let service = Arc::new(service);
        let issued = service.login("555-0100", "secret").await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                let token = issued.token.clone();
                tokio::spawn(async move { service.authenticate(&token).await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), id);
        }
    }
}

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::models::IdentityId;
use crate::store::{with_deadline, CredentialStore};

/// Hash a password with bcrypt at the given cost.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost).map_err(|e| AuthError::Internal(format!("bcrypt hash failed: {}", e)))
}

/// Checks presented secrets against stored bcrypt hashes
pub struct CredentialVerifier {
    store: Arc<dyn CredentialStore>,
    store_timeout: Duration,
    // Verified against when the identity is unknown so both failure
    // branches pay for one bcrypt comparison.
    dummy_hash: String,
}

impl CredentialVerifier {
    pub fn new(store: Arc<dyn CredentialStore>, config: &AuthConfig) -> Result<Self, AuthError> {
        Ok(Self {
            store,
            store_timeout: config.store_timeout,
            dummy_hash: hash_password("customer-auth-dummy", config.bcrypt_cost)?,
        })
    }

    /// Customer check: phone number and password to identity id.
    pub async fn verify_customer_credentials(
        &self,
        phone: &str,
        password: &str,
    ) -> Result<IdentityId, AuthError> {
        let credential = with_deadline(self.store_timeout, self.store.lookup_customer(phone)).await?;

        let Some(credential) = credential else {
            self.check_password(password, self.dummy_hash.clone()).await?;
            debug!("customer login for unknown phone");
            return Err(AuthError::NoSuchIdentity);
        };

        if self
            .check_password(password, credential.password_hash.clone())
            .await?
        {
            Ok(credential.id)
        } else {
            debug!(customer_id = %credential.id, "customer password mismatch");
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Staff Basic-auth check. Every failure, including store errors, is `false`.
    pub async fn verify_staff_credentials(&self, login: &str, password: &str) -> bool {
        if login.is_empty() || password.is_empty() {
            return false;
        }

        let credential = match with_deadline(self.store_timeout, self.store.lookup_staff(login)).await {
            Ok(credential) => credential,
            Err(err) => {
                error!(error = %err, "staff credential lookup failed");
                return false;
            }
        };

        let hash = match credential {
            Some(credential) => credential.password_hash,
            None => {
                if let Err(err) = self.check_password(password, self.dummy_hash.clone()).await {
                    error!(error = %err, "staff dummy password check failed");
                }
                return false;
            }
        };

        match self.check_password(password, hash).await {
            Ok(matched) => matched,
            Err(err) => {
                error!(error = %err, "staff password check failed");
                false
            }
        }
    }

    /// bcrypt comparison on the blocking pool. A malformed stored hash counts
    /// as a mismatch.
    async fn check_password(&self, password: &str, hash: String) -> Result<bool, AuthError> {
        let password = password.to_owned();
        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("password check task failed: {}", e)))?;

        match outcome {
            Ok(matched) => Ok(matched),
            Err(err) => {
                warn!(error = %err, "stored credential hash is not valid bcrypt");
                Ok(false)
            }
        }
    }
}

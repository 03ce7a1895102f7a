use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{CredentialStore, StoreError, TokenStore};
use crate::models::{IdentityId, StoredCredential, TokenRecord};

/// In-process store with the same semantics as `PgStore`
#[derive(Debug, Default)]
pub struct MemoryStore {
    customers: RwLock<HashMap<String, StoredCredential>>,
    staff: RwLock<HashMap<String, StoredCredential>>,
    tokens: RwLock<HashMap<String, TokenRecord>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a customer with an already-computed bcrypt hash.
    pub async fn add_customer(&self, phone: &str, password_hash: String) -> IdentityId {
        let id = self.allocate_id();
        self.customers.write().await.insert(
            phone.to_string(),
            StoredCredential { id, password_hash },
        );
        id
    }

    /// Register a staff member with an already-computed bcrypt hash.
    pub async fn add_staff(&self, login: &str, password_hash: String) -> IdentityId {
        let id = self.allocate_id();
        self.staff.write().await.insert(
            login.to_string(),
            StoredCredential { id, password_hash },
        );
        id
    }

    pub async fn token_count(&self) -> usize {
        self.tokens.read().await.len()
    }

    fn allocate_id(&self) -> IdentityId {
        IdentityId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn lookup_customer(&self, phone: &str) -> Result<Option<StoredCredential>, StoreError> {
        Ok(self.customers.read().await.get(phone).cloned())
    }

    async fn lookup_staff(&self, login: &str) -> Result<Option<StoredCredential>, StoreError> {
        Ok(self.staff.read().await.get(login).cloned())
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn insert_token(&self, record: &TokenRecord) -> Result<(), StoreError> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&record.token_digest) {
            return Err(StoreError::DuplicateToken);
        }
        tokens.insert(record.token_digest.clone(), record.clone());
        Ok(())
    }

    async fn lookup_token(&self, token_digest: &str) -> Result<Option<TokenRecord>, StoreError> {
        Ok(self.tokens.read().await.get(token_digest).cloned())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, record| record.expires_at > now);
        Ok((before - tokens.len()) as u64)
    }
}

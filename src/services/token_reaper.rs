use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::store::{with_deadline, StoreError, TokenStore};

/// Periodically deletes expired session tokens.
///
/// Expiry is enforced at resolution time; this only keeps the token table
/// from growing without bound.
pub struct TokenReaper {
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    store_timeout: Duration,
}

impl TokenReaper {
    pub fn new(
        store: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
        interval: Duration,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            interval,
            store_timeout,
        }
    }

    pub async fn run_once(&self) -> Result<u64, StoreError> {
        let now = self.clock.now();
        let purged = with_deadline(self.store_timeout, self.store.purge_expired(now)).await?;
        if purged > 0 {
            info!(purged, "expired session tokens purged");
        } else {
            debug!("no expired session tokens");
        }
        Ok(purged)
    }

    pub async fn start(self: Arc<Self>) {
        info!(interval_secs = self.interval.as_secs(), "token reaper started");

        loop {
            sleep(self.interval).await;

            if let Err(err) = self.run_once().await {
                error!(error = %err, "token reaper cycle failed");
            }
        }
    }

    /// Run the reaper loop on its own task, respawning it after a panic with
    /// exponential backoff capped at `max_backoff`.
    pub fn supervise(self: Arc<Self>, max_backoff: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut restarts: u32 = 0;
            loop {
                let Err(join_error) = tokio::spawn(self.clone().start()).await else {
                    info!("token reaper exited; supervisor done");
                    return;
                };

                if join_error.is_cancelled() {
                    warn!("token reaper cancelled; supervisor done");
                    return;
                }
                error!(error = %join_error, "token reaper panicked");

                restarts = restarts.saturating_add(1);
                let delay = restart_backoff(restarts, max_backoff);
                warn!(restarts, delay_secs = delay.as_secs(), "restarting token reaper");
                sleep(delay).await;
            }
        })
    }
}

/// Delay before the `restarts`-th restart: 1s, 2s, 4s, ... up to `max_backoff`.
pub fn restart_backoff(restarts: u32, max_backoff: Duration) -> Duration {
    let exponent = restarts.saturating_sub(1).min(16);
    Duration::from_secs(1u64 << exponent).min(max_backoff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenIssuer;
    use crate::clock::ManualClock;
    use crate::config::AuthConfig;
    use crate::models::IdentityId;
    use crate::store::MemoryStore;
    use chrono::Utc;

    #[tokio::test]
    async fn purges_tokens_once_past_ttl() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let config = AuthConfig::default();
        let issuer = TokenIssuer::new(store.clone(), clock.clone(), &config);
        let reaper = TokenReaper::new(
            store.clone(),
            clock.clone(),
            config.reap_interval,
            config.store_timeout,
        );

        issuer.issue_token(IdentityId(1)).await.unwrap();
        issuer.issue_token(IdentityId(2)).await.unwrap();
        assert_eq!(reaper.run_once().await.unwrap(), 0);

        clock.advance(config.token_ttl);
        assert_eq!(reaper.run_once().await.unwrap(), 2);
        assert_eq!(store.token_count().await, 0);
    }

    #[test]
    fn restart_backoff_doubles_up_to_cap() {
        let cap = Duration::from_secs(30);
        let delays: Vec<u64> = (1..=7).map(|n| restart_backoff(n, cap).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 30, 30]);
        assert_eq!(restart_backoff(u32::MAX, cap), cap);
        assert_eq!(restart_backoff(3, Duration::from_secs(2)), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn supervisor_stops_when_aborted() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let reaper = Arc::new(TokenReaper::new(
            store,
            clock,
            Duration::from_secs(3600),
            Duration::from_secs(1),
        ));

        let handle = reaper.supervise(Duration::from_secs(30));
        assert!(!handle.is_finished());
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}

use std::time::Duration as StdDuration;

use anyhow::{bail, Context, Result};
use chrono::Duration;

/// Default token lifetime: 24 hours.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 3600;

/// Random bytes per token before hex encoding (32 bytes = 64 hex chars).
pub const DEFAULT_TOKEN_BYTES: usize = 32;

/// Tokens shorter than this are refused at startup.
pub const MIN_TOKEN_BYTES: usize = 16;

/// Upper bound on random bytes per token (2048 hex chars).
pub const MAX_TOKEN_BYTES: usize = 1024;

/// Longest accepted token lifetime: 365 days.
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 3600;

const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_REAP_INTERVAL_SECS: u64 = 3_600;
const DEFAULT_REAPER_MAX_BACKOFF_SECS: u64 = 30;

/// Credential and session token policy
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Fixed lifetime of a session token from issuance
    pub token_ttl: Duration,
    /// Random bytes drawn from the OS RNG per token
    pub token_bytes: usize,
    /// bcrypt work factor for hashes produced by this service
    pub bcrypt_cost: u32,
    /// Upper bound on any single store call
    pub store_timeout: StdDuration,
    /// Period of the expired-token reaper
    pub reap_interval: StdDuration,
    /// Longest pause before restarting a crashed reaper
    pub reaper_max_backoff: StdDuration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            token_bytes: DEFAULT_TOKEN_BYTES,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            store_timeout: StdDuration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            reap_interval: StdDuration::from_secs(DEFAULT_REAP_INTERVAL_SECS),
            reaper_max_backoff: StdDuration::from_secs(DEFAULT_REAPER_MAX_BACKOFF_SECS),
        }
    }
}

impl AuthConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let ttl_secs: i64 = parse_or(&lookup, "AUTH_TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS)?;
        if !(1..=MAX_TOKEN_TTL_SECS).contains(&ttl_secs) {
            bail!(
                "AUTH_TOKEN_TTL_SECS must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_SECS,
                ttl_secs
            );
        }
        let Some(token_ttl) = Duration::try_seconds(ttl_secs) else {
            bail!("AUTH_TOKEN_TTL_SECS is out of range: {}", ttl_secs);
        };

        let token_bytes: usize = parse_or(&lookup, "AUTH_TOKEN_BYTES", DEFAULT_TOKEN_BYTES)?;
        if !(MIN_TOKEN_BYTES..=MAX_TOKEN_BYTES).contains(&token_bytes) {
            bail!(
                "AUTH_TOKEN_BYTES must be between {} and {}, got {}",
                MIN_TOKEN_BYTES,
                MAX_TOKEN_BYTES,
                token_bytes
            );
        }

        let bcrypt_cost: u32 = parse_or(&lookup, "AUTH_BCRYPT_COST", defaults.bcrypt_cost)?;
        if !(4..=31).contains(&bcrypt_cost) {
            bail!("AUTH_BCRYPT_COST must be between 4 and 31, got {}", bcrypt_cost);
        }

        let store_timeout_ms: u64 =
            parse_or(&lookup, "AUTH_STORE_TIMEOUT_MS", DEFAULT_STORE_TIMEOUT_MS)?;
        if store_timeout_ms == 0 {
            bail!("AUTH_STORE_TIMEOUT_MS must be positive");
        }
        let reap_interval_secs: u64 =
            parse_or(&lookup, "TOKEN_REAP_INTERVAL_SECS", DEFAULT_REAP_INTERVAL_SECS)?;
        if reap_interval_secs == 0 {
            bail!("TOKEN_REAP_INTERVAL_SECS must be positive");
        }
        let reaper_max_backoff_secs: u64 = parse_or(
            &lookup,
            "TOKEN_REAPER_MAX_BACKOFF_SECS",
            DEFAULT_REAPER_MAX_BACKOFF_SECS,
        )?;
        if reaper_max_backoff_secs == 0 {
            bail!("TOKEN_REAPER_MAX_BACKOFF_SECS must be positive");
        }

        Ok(Self {
            token_ttl,
            token_bytes,
            bcrypt_cost,
            store_timeout: StdDuration::from_millis(store_timeout_ms),
            reap_interval: StdDuration::from_secs(reap_interval_secs),
            reaper_max_backoff: StdDuration::from_secs(reaper_max_backoff_secs),
        })
    }
}

pub(crate) fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        _ => Ok(default),
    }
}

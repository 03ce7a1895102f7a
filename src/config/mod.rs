//! Service configuration loaded from the environment

pub mod auth;

use std::env;
use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};

pub use auth::AuthConfig;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub cors_allowed_origins: Vec<String>,
    pub auth: AuthConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = auth::parse_or(&lookup, "HOST", IpAddr::from([0, 0, 0, 0]))?;
        let port = auth::parse_or(&lookup, "PORT", 9999u16)?;
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .context("DATABASE_URL must be set")?;
        let database_max_connections = auth::parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            host,
            port,
            database_url,
            database_max_connections,
            cors_allowed_origins,
            auth: AuthConfig::from_lookup(&lookup)?,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

//! Customer Auth Server
//!
//! Serves customer token issuance/validation and staff-only housekeeping
//! over a Postgres credential and token store.

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use customer_auth::app_state::AppState;
use customer_auth::auth::AuthService;
use customer_auth::clock::{Clock, SystemClock};
use customer_auth::config::Config;
use customer_auth::routes;
use customer_auth::services::TokenReaper;
use customer_auth::store::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,customer_auth=debug")),
        )
        .init();

    let config = Config::from_env()?;

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(config.auth.store_timeout)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("failed to run database migrations")?;

    let store = Arc::new(PgStore::new(db_pool));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let auth_service = AuthService::new(store.clone(), store.clone(), clock.clone(), &config.auth)
        .context("failed to initialise auth service")?;
    let token_reaper = Arc::new(TokenReaper::new(
        store,
        clock,
        config.auth.reap_interval,
        config.auth.store_timeout,
    ));

    token_reaper.clone().supervise(config.auth.reaper_max_backoff);

    let state = AppState::new(Arc::new(auth_service), token_reaper);
    let app = routes::app(state, routes::cors_layer(&config.cors_allowed_origins));

    let addr = config.bind_addr();
    info!("Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! Application state shared across handlers

use std::sync::Arc;

use crate::auth::AuthService;
use crate::services::TokenReaper;

use axum::extract::FromRef;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub token_reaper: Arc<TokenReaper>,
}

impl AppState {
    pub fn new(auth_service: Arc<AuthService>, token_reaper: Arc<TokenReaper>) -> Self {
        Self {
            auth_service,
            token_reaper,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<TokenReaper> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.token_reaper.clone()
    }
}

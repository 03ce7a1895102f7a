//! Route definitions for the customer auth API

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::app_state::AppState;
use crate::handlers::*;
use crate::middleware::{request_tracing, require_staff};
use tracing::warn;

// Customer token routes
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/api/customers/token", post(issue_token))
        .route("/api/customers/token/validate", post(validate_token))
        .route("/api/customers/me", get(current_customer))
}

// Staff routes, behind Basic auth
pub fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/tokens/purge", post(purge_expired_tokens))
        .route_layer(middleware::from_fn_with_state(state, require_staff))
}

/// Full application router
pub fn app(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(customer_routes())
        .merge(admin_routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(middleware::from_fn(request_tracing)),
        )
        .with_state(state)
}

/// CORS policy for the configured browser origins. Entries that are not
/// valid header values are skipped with a warning.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let mut allowed = Vec::with_capacity(origins.len());
    for origin in origins {
        match HeaderValue::from_str(origin) {
            Ok(value) => allowed.push(value),
            Err(_) => warn!(origin = %origin, "ignoring invalid CORS origin"),
        }
    }

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

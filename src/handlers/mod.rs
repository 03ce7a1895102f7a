//! API handlers for the customer auth service

pub mod admin;
pub mod auth;

pub use admin::purge_expired_tokens;
pub use auth::{current_customer, issue_token, validate_token};

pub async fn root() -> &'static str {
    "Customer Auth API Server"
}

pub async fn health_check() -> &'static str {
    "OK"
}

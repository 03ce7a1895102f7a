//! Customer Auth Backend Library
//!
//! Credential verification and the session-token lifecycle for the customer
//! service, plus the thin HTTP layer that exposes them.

pub mod app_state;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

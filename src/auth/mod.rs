//! Authentication module for the customer service
//!
//! - bcrypt credential checks for customers (phone/password) and staff (Basic auth)
//! - Session token issuance backed by the OS random source
//! - Token resolution with fixed, non-sliding expiry

mod credentials;
mod service;
mod tokens;

pub use credentials::{hash_password, CredentialVerifier};
pub use service::AuthService;
pub use tokens::{token_digest, TokenIssuer, TokenResolver};

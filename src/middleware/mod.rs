//! Middleware for the customer auth API
//!
//! Request tracing, the staff Basic-auth guard and the customer bearer
//! extractor.

pub mod auth;
mod tracing;

pub use auth::{require_staff, AuthenticatedCustomer};
pub use self::tracing::{request_tracing, REQUEST_ID_HEADER};

//! Error types for credential checks and the token lifecycle

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ApiResponse;
use crate::store::StoreError;

/// Failures of `login` / `authenticate` and their building blocks
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no such identity")]
    NoSuchIdentity,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("no such token")]
    NoSuchToken,

    #[error("token expired")]
    TokenExpired,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

/// HTTP-facing error
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("staff authentication required")]
    StaffUnauthorized,

    #[error("bearer token required")]
    MissingBearer,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Auth(AuthError::NoSuchIdentity | AuthError::InvalidCredentials) => {
                (StatusCode::UNAUTHORIZED, "invalid credentials".to_string())
            }
            ApiError::Auth(AuthError::NoSuchToken) => (StatusCode::NOT_FOUND, "not found".to_string()),
            ApiError::Auth(AuthError::TokenExpired) => (StatusCode::UNAUTHORIZED, "expired".to_string()),
            ApiError::Auth(AuthError::Internal(detail)) | ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            ApiError::StaffUnauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::MissingBearer => (StatusCode::UNAUTHORIZED, self.to_string()),
        };

        let mut response = (status, Json(ApiResponse::<()>::fail(message))).into_response();
        if matches!(self, ApiError::StaffUnauthorized) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"staff\""),
            );
        }
        response
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

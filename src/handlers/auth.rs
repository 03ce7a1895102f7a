use std::sync::Arc;

use axum::{extract::State, Json};
use validator::Validate;

use crate::auth::AuthService;
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthenticatedCustomer;
use crate::models::{
    ApiResponse, CustomerIdentity, TokenRequest, TokenResponse, ValidateTokenRequest,
};

/// Exchange a customer's phone/password for a session token
pub async fn issue_token(
    State(auth_service): State<Arc<AuthService>>,
    Json(request): Json<TokenRequest>,
) -> ApiResult<Json<ApiResponse<TokenResponse>>> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let issued = auth_service.login(&request.login, &request.password).await?;

    Ok(Json(ApiResponse::ok(TokenResponse {
        token: issued.token,
        expires_at: issued.expires_at,
    })))
}

/// Resolve a token from the request body to its customer
pub async fn validate_token(
    State(auth_service): State<Arc<AuthService>>,
    Json(request): Json<ValidateTokenRequest>,
) -> ApiResult<Json<ApiResponse<CustomerIdentity>>> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let customer_id = auth_service.authenticate(&request.token).await?;

    Ok(Json(ApiResponse::ok(CustomerIdentity { customer_id })))
}

/// Current customer from the bearer header
pub async fn current_customer(
    AuthenticatedCustomer(customer_id): AuthenticatedCustomer,
) -> Json<ApiResponse<CustomerIdentity>> {
    Json(ApiResponse::ok(CustomerIdentity { customer_id }))
}

//! Staff Basic-auth guard and the customer bearer-token extractor

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::TypedHeader;
use headers::{
    authorization::{Basic, Bearer},
    Authorization, HeaderMapExt,
};

use crate::auth::AuthService;
use crate::error::ApiError;
use crate::models::IdentityId;

/// Reject the request unless it carries valid staff Basic credentials.
pub async fn require_staff(
    State(auth_service): State<Arc<AuthService>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(Authorization(basic)) = request.headers().typed_get::<Authorization<Basic>>() else {
        return Err(ApiError::StaffUnauthorized);
    };

    if !auth_service
        .verify_staff(basic.username(), basic.password())
        .await
    {
        tracing::debug!("staff basic auth rejected");
        return Err(ApiError::StaffUnauthorized);
    }

    Ok(next.run(request).await)
}

/// Customer resolved from `Authorization: Bearer <token>`
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedCustomer(pub IdentityId);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedCustomer
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::MissingBearer)?;

        let auth_service = Arc::<AuthService>::from_ref(state);
        let customer_id = auth_service.authenticate(bearer.token()).await?;

        Ok(AuthenticatedCustomer(customer_id))
    }
}

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::error::ApiResult;
use crate::models::{ApiResponse, PurgeResponse};
use crate::services::TokenReaper;

/// Run one reaper pass on demand. Staff only.
pub async fn purge_expired_tokens(
    State(token_reaper): State<Arc<TokenReaper>>,
) -> ApiResult<Json<ApiResponse<PurgeResponse>>> {
    let purged = token_reaper.run_once().await?;
    Ok(Json(ApiResponse::ok(PurgeResponse { purged })))
}

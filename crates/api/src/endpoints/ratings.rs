//! Rating endpoint.

use axum::{
    Json,
    extract::{Path, State},
};
use quire_common::AppResult;
use quire_core::RatingOutcome;
use serde::Deserialize;

use crate::{
    extractors::{MaybeAuthUser, OriginAddress},
    middleware::AppState,
    response::ApiResponse,
};

/// Vote request.
#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    /// 1 to like, -1 to dislike.
    pub value: i64,
}

/// Like or dislike an article; repeating a vote withdraws it.
pub(super) async fn submit(
    MaybeAuthUser(user): MaybeAuthUser,
    OriginAddress(origin): OriginAddress,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(req): Json<RatingRequest>,
) -> AppResult<ApiResponse<RatingOutcome>> {
    let outcome = state
        .rating_service
        .submit(
            &slug,
            &origin,
            req.value,
            user.as_ref().map(|u| u.id.as_str()),
        )
        .await?;

    Ok(ApiResponse::ok(outcome))
}

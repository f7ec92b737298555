//! Comment endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use quire_common::AppResult;
use quire_core::CreateCommentInput;
use quire_db::entities::comment;
use serde::Serialize;

use super::categories::DeletedResponse;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Comment representation.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub article_id: String,
    pub author_id: String,
    pub parent_id: Option<String>,
    pub content: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<comment::Model> for CommentResponse {
    fn from(comment: comment::Model) -> Self {
        Self {
            id: comment.id,
            article_id: comment.article_id,
            author_id: comment.author_id,
            parent_id: comment.parent_id,
            content: comment.content,
            created_at: comment.created_at.to_rfc3339(),
            updated_at: comment.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Comment positioned in its thread.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNodeResponse {
    pub depth: usize,
    #[serde(flatten)]
    pub comment: CommentResponse,
}

/// Comment thread of an article, replies under their parents.
pub(super) async fn list(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<ApiResponse<Vec<CommentNodeResponse>>> {
    let thread = state.comment_service.list(&slug).await?;
    Ok(ApiResponse::ok(
        thread
            .into_iter()
            .map(|node| CommentNodeResponse {
                depth: node.depth,
                comment: node.comment.into(),
            })
            .collect(),
    ))
}

/// Post a comment on an article.
pub(super) async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(input): Json<CreateCommentInput>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state.comment_service.create(&user.id, &slug, input).await?;
    Ok(ApiResponse::ok(comment.into()))
}

/// Delete a comment and its replies.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<DeletedResponse>> {
    let deleted_ids = state.comment_service.delete(&user.id, &id).await?;
    Ok(ApiResponse::ok(DeletedResponse { deleted_ids }))
}

/// Routes under `/comments`.
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/delete", post(delete))
}

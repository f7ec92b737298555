//! Category endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use quire_common::{AppResult, Page};
use quire_core::CreateCategoryInput;
use quire_db::entities::category;
use serde::Serialize;

use super::articles::ArticleResponse;
use crate::{
    extractors::{AuthUser, Pagination},
    middleware::AppState,
    response::ApiResponse,
};

/// Category representation.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<String>,
    pub created_at: String,
}

impl From<category::Model> for CategoryResponse {
    fn from(category: category::Model) -> Self {
        Self {
            id: category.id,
            title: category.title,
            slug: category.slug,
            description: category.description,
            parent_id: category.parent_id,
            created_at: category.created_at.to_rfc3339(),
        }
    }
}

/// Category positioned in the tree listing.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNodeResponse {
    pub depth: usize,
    #[serde(flatten)]
    pub category: CategoryResponse,
}

/// Category page: the category, its children and its breadcrumbs.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetailResponse {
    #[serde(flatten)]
    pub category: CategoryResponse,
    pub children: Vec<CategoryResponse>,
    pub ancestors: Vec<CategoryResponse>,
}

/// Removed category ids.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub deleted_ids: Vec<String>,
}

/// Every category in tree order.
async fn list(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<CategoryNodeResponse>>> {
    let tree = state.category_service.list_tree().await?;
    Ok(ApiResponse::ok(
        tree.into_iter()
            .map(|node| CategoryNodeResponse {
                depth: node.depth,
                category: node.category.into(),
            })
            .collect(),
    ))
}

/// Create a category.
async fn create(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCategoryInput>,
) -> AppResult<ApiResponse<CategoryResponse>> {
    let category = state.category_service.create(input).await?;
    Ok(ApiResponse::ok(category.into()))
}

/// Show a category.
async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<ApiResponse<CategoryDetailResponse>> {
    let detail = state.category_service.detail(&slug).await?;

    Ok(ApiResponse::ok(CategoryDetailResponse {
        category: detail.category.into(),
        children: detail.children.into_iter().map(Into::into).collect(),
        ancestors: detail.ancestors.into_iter().map(Into::into).collect(),
    }))
}

/// Articles of a category, falling back to its direct children.
async fn articles(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Pagination(page): Pagination,
) -> AppResult<ApiResponse<Page<ArticleResponse>>> {
    let articles = state.category_service.articles(&slug, page).await?;
    Ok(ApiResponse::ok(articles.map(ArticleResponse::from)))
}

/// Delete a category subtree.
async fn delete(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<ApiResponse<DeletedResponse>> {
    let deleted_ids = state.category_service.delete(&slug).await?;
    Ok(ApiResponse::ok(DeletedResponse { deleted_ids }))
}

/// Routes under `/categories`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/create", post(create))
        .route("/{slug}", get(show))
        .route("/{slug}/articles", get(articles))
        .route("/{slug}/delete", post(delete))
}

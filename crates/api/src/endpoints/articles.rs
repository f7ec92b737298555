//! Article endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use quire_common::{AppResult, Page};
use quire_core::{CreateArticleInput, UpdateArticleInput};
use quire_db::entities::article;
use serde::Serialize;

use crate::{
    extractors::{AuthUser, MaybeAuthUser, Pagination},
    middleware::AppState,
    response::ApiResponse,
};

/// Article representation.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResponse {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub text: String,
    pub thumbnail: String,
    pub status: article::Status,
    pub category_id: String,
    pub author_id: String,
    pub updater_id: Option<String>,
    pub fixed: bool,
    pub views: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<article::Model> for ArticleResponse {
    fn from(article: article::Model) -> Self {
        Self {
            id: article.id,
            title: article.title,
            slug: article.slug,
            description: article.description,
            text: article.text,
            thumbnail: article.thumbnail,
            status: article.status,
            category_id: article.category_id,
            author_id: article.author_id,
            updater_id: article.updater_id,
            fixed: article.fixed,
            views: article.views,
            created_at: article.created_at.to_rfc3339(),
            updated_at: article.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Article page with its score.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDetailResponse {
    #[serde(flatten)]
    pub article: ArticleResponse,
    pub rating_sum: i64,
}

/// Article with its comment count.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentedArticleResponse {
    #[serde(flatten)]
    pub article: ArticleResponse,
    pub comment_count: i64,
}

/// List published articles.
async fn list(
    State(state): State<AppState>,
    Pagination(page): Pagination,
) -> AppResult<ApiResponse<Page<ArticleResponse>>> {
    let articles = state.article_service.list(page).await?;
    Ok(ApiResponse::ok(articles.map(ArticleResponse::from)))
}

/// Create an article.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateArticleInput>,
) -> AppResult<ApiResponse<ArticleResponse>> {
    let article = state.article_service.create(&user.id, input).await?;
    Ok(ApiResponse::ok(article.into()))
}

/// Show an article, counting the view.
async fn show(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<ApiResponse<ArticleDetailResponse>> {
    let viewer = user.as_ref().map(|u| u.id.as_str());
    let detail = state.article_service.view(&slug, viewer).await?;

    Ok(ApiResponse::ok(ArticleDetailResponse {
        article: detail.article.into(),
        rating_sum: detail.rating_sum,
    }))
}

/// Edit an article.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(input): Json<UpdateArticleInput>,
) -> AppResult<ApiResponse<ArticleResponse>> {
    let article = state.article_service.update(&user.id, &slug, input).await?;
    Ok(ApiResponse::ok(article.into()))
}

/// Published articles of one author.
async fn by_author(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Pagination(page): Pagination,
) -> AppResult<ApiResponse<Page<ArticleResponse>>> {
    let articles = state.article_service.by_author(&slug, page).await?;
    Ok(ApiResponse::ok(articles.map(ArticleResponse::from)))
}

/// Most viewed articles.
async fn popular(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<ArticleResponse>>> {
    let articles = state.article_service.popular().await?;
    Ok(ApiResponse::ok(
        articles.into_iter().map(ArticleResponse::from).collect(),
    ))
}

/// Most commented articles.
async fn most_commented(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<CommentedArticleResponse>>> {
    let articles = state.article_service.most_commented().await?;
    Ok(ApiResponse::ok(
        articles
            .into_iter()
            .map(|entry| CommentedArticleResponse {
                article: entry.article.into(),
                comment_count: entry.comment_count,
            })
            .collect(),
    ))
}

/// Routes under `/articles`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/create", post(create))
        .route("/popular", get(popular))
        .route("/most-commented", get(most_commented))
        .route("/by-author/{slug}", get(by_author))
        .route("/{slug}", get(show))
        .route("/{slug}/update", post(update))
        .route(
            "/{slug}/comments",
            get(super::comments::list).post(super::comments::create),
        )
        .route("/{slug}/rating", post(super::ratings::submit))
}

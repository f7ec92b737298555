//! User endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use quire_common::AppResult;
use quire_core::{CreateUserInput, UpdateProfileInput};
use quire_db::entities::user;
use serde::Serialize;

use super::articles::ArticleResponse;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Public user representation.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub slug: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub birth_date: Option<String>,
    pub avatar_url: String,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            slug: user.slug,
            first_name: user.first_name,
            last_name: user.last_name,
            bio: user.bio,
            birth_date: user.birth_date.map(|d| d.to_string()),
            avatar_url: user.avatar_url,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// A freshly created user and the token identifying them.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUserResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: Option<String>,
}

/// Profile page response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub latest_articles: Vec<ArticleResponse>,
    pub article_count: u64,
}

/// Create a user.
async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateUserInput>,
) -> AppResult<ApiResponse<CreatedUserResponse>> {
    let user = state.user_service.create(input).await?;
    let token = user.token.clone();

    Ok(ApiResponse::ok(CreatedUserResponse {
        user: user.into(),
        token,
    }))
}

/// Show a profile page.
async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let profile = state.user_service.profile(&slug).await?;

    Ok(ApiResponse::ok(ProfileResponse {
        user: profile.user.into(),
        latest_articles: profile
            .latest_articles
            .into_iter()
            .map(ArticleResponse::from)
            .collect(),
        article_count: profile.article_count,
    }))
}

/// Update the caller's profile.
async fn update_me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let updated = state.user_service.update_profile(&user.id, input).await?;
    Ok(ApiResponse::ok(updated.into()))
}

/// Routes under `/users`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/{slug}", get(show))
}

/// Routes under `/i`, acting on the authenticated user.
pub fn me_router() -> Router<AppState> {
    Router::new().route("/update", post(update_me))
}

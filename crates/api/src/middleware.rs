//! API middleware and shared state.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use quire_common::config::BlogConfig;
use quire_core::{ArticleService, CategoryService, CommentService, RatingService, UserService};
use quire_db::repositories::{
    ArticleRepository, CategoryRepository, CommentRepository, RatingRepository, UserRepository,
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub category_service: CategoryService,
    pub article_service: ArticleService,
    pub comment_service: CommentService,
    pub rating_service: RatingService,
    pub blog: BlogConfig,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, blog: BlogConfig) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let category_repo = CategoryRepository::new(Arc::clone(&db));
        let article_repo = ArticleRepository::new(Arc::clone(&db));
        let comment_repo = CommentRepository::new(Arc::clone(&db));
        let rating_repo = RatingRepository::new(db);

        Self {
            user_service: UserService::new(user_repo.clone(), article_repo.clone()),
            category_service: CategoryService::new(category_repo.clone(), article_repo.clone()),
            article_service: ArticleService::new(
                article_repo.clone(),
                category_repo,
                user_repo,
                rating_repo.clone(),
                blog.popular_limit,
            ),
            comment_service: CommentService::new(comment_repo, article_repo.clone()),
            rating_service: RatingService::new(rating_repo, article_repo),
            blog,
        }
    }
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to a user and stores it in the
/// request extensions for [`crate::extractors::AuthUser`]. Unknown tokens
/// leave the request anonymous.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string);

    if let Some(token) = token {
        match state.user_service.authenticate_by_token(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unusable bearer token");
            }
        }
    }

    next.run(req).await
}

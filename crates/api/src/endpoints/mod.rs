//! API endpoints.

mod articles;
mod categories;
mod comments;
mod ratings;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/i", users::me_router())
        .nest("/categories", categories::router())
        .nest("/articles", articles::router())
        .nest("/comments", comments::router())
}

//! HTTP API layer for quire.
//!
//! - **Endpoints**: JSON routes for users, categories, articles, comments
//!   and ratings
//! - **Extractors**: bearer-token identity, voter origin address, pagination
//! - **Middleware**: application state and token authentication
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};

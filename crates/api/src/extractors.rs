//! Request extractors.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts, Query},
    http::{HeaderMap, request::Parts},
};
use quire_common::{AppError, PageRequest};
use quire_db::entities::user;
use serde::Deserialize;

use crate::middleware::AppState;

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Optional authenticated user extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<user::Model>().cloned()))
    }
}

/// Network address a vote is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginAddress(pub String);

/// Resolve the origin address of a request.
///
/// With `trust_forwarded_for`, the first parseable `X-Forwarded-For` entry
/// wins; otherwise (or when the header is absent or garbage) the direct
/// peer address is used.
#[must_use]
pub fn resolve_origin(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded_for: bool,
) -> Option<IpAddr> {
    let forwarded = if trust_forwarded_for {
        headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .and_then(|first| first.trim().parse::<IpAddr>().ok())
    } else {
        None
    };

    forwarded.or_else(|| peer.map(|addr| addr.ip()))
}

impl FromRequestParts<AppState> for OriginAddress {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        resolve_origin(&parts.headers, peer, state.blog.trust_forwarded_for)
            .map(|ip| Self(ip.to_string()))
            .ok_or_else(|| AppError::BadRequest("Cannot determine origin address".to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageQuery {
    page: Option<u64>,
    per_page: Option<u64>,
}

/// Page request from the `page` and `perPage` query parameters, sized by
/// the blog configuration.
#[derive(Debug, Clone, Copy)]
pub struct Pagination(pub PageRequest);

impl FromRequestParts<AppState> for Pagination {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<PageQuery>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        Ok(Self(PageRequest::new(
            query.page,
            query.per_page,
            state.blog.default_page_size,
            state.blog.max_page_size,
        )))
    }
}

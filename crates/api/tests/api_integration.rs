//! API integration tests.
//!
//! These tests drive the full router (auth middleware included) over a
//! mock database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
};
use quire_api::{AppState, auth_middleware, router as api_router};
use quire_common::config::BlogConfig;
use quire_db::entities::{article, rating, user};
use quire_db::test_utils::fixtures;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use serde_json::Value;
use tower::ServiceExt;

/// Build the application router over a prepared mock database.
fn create_test_router(db: DatabaseConnection) -> Router {
    let state = AppState::new(Arc::new(db), BlogConfig::default());
    Router::new()
        .nest("/api", api_router())
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

fn empty_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

fn count_row(n: i64) -> [BTreeMap<&'static str, sea_orm::Value>; 1] {
    [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }]
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/nonexistent/endpoint")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_article_requires_auth() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/articles/create")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"title":"Hi","description":"","text":"x","category":"rust"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_unknown_token_stays_anonymous() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/i/update")
                .method("POST")
                .header("Authorization", "Bearer bogus")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"bio":"hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_category_tree() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![
            fixtures::category("c2", "Rust", Some("c1")),
            fixtures::category("c1", "Languages", None),
            fixtures::category("c3", "Ada", Some("c1")),
        ]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/categories")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let titles: Vec<(u64, &str)> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| (n["depth"].as_u64().unwrap(), n["title"].as_str().unwrap()))
        .collect();
    assert_eq!(titles, vec![(0, "Languages"), (1, "Ada"), (1, "Rust")]);
}

#[tokio::test]
async fn test_article_list_pagination() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([count_row(5)])
        .append_query_results([[
            fixtures::article("a3", "third", "c1", "u1"),
            fixtures::article("a4", "fourth", "c1", "u1"),
        ]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/articles?page=2&perPage=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["page"], 2);
    assert_eq!(body["data"]["perPage"], 2);
    assert_eq!(body["data"]["total"], 5);
    assert_eq!(body["data"]["totalPages"], 3);
    assert_eq!(body["data"]["items"][0]["slug"], "third");
}

#[tokio::test]
async fn test_huge_page_is_capped() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([count_row(5)])
        .append_query_results([Vec::<article::Model>::new()])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/articles?page=1000000000000000000&perPage=50")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    // Last page whose offset still fits a signed 64-bit bind
    assert_eq!(body["data"]["page"], 184_467_440_737_095_517_u64);
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_bad_pagination_query() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/articles?page=first")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_popular_is_not_an_article_slug() {
    let mut viewed = fixtures::article("a1", "viewed", "c1", "u1");
    viewed.views = 40;
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[viewed]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/articles/popular")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"][0]["views"], 40);
}

#[tokio::test]
async fn test_rating_rejects_out_of_range_value() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/articles/answer/rating")
                .method("POST")
                .header("Content-Type", "application/json")
                .header("X-Forwarded-For", "1.2.3.4")
                .body(Body::from(r#"{"value":5}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_rating_without_origin_is_rejected() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/articles/answer/rating")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"value":1}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_first_rating_is_created() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[fixtures::article("a42", "answer", "c1", "u1")]])
        .append_query_results([Vec::<rating::Model>::new()])
        .append_query_results([[fixtures::rating("r1", "a42", "1.2.3.4", 1)]])
        .append_query_results([[maplit::btreemap! {
            "sum" => sea_orm::Value::BigInt(Some(1))
        }]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/articles/answer/rating")
                .method("POST")
                .header("Content-Type", "application/json")
                .header("X-Forwarded-For", "1.2.3.4, 10.0.0.1")
                .body(Body::from(r#"{"value":1}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body,
        serde_json::json!({"data": {"status": "created", "ratingSum": 1}})
    );
}

#[tokio::test]
async fn test_deleting_someone_elses_comment_is_forbidden() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[fixtures::user("u9", "Mallory")]])
        .append_query_results([[fixtures::comment("c1", "a1", None, 0)]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/comments/c1/delete")
                .method("POST")
                .header("Authorization", "Bearer token-u9")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_article_comments() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<article::Model>::new()])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/articles/nope/comments")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "ARTICLE_NOT_FOUND");
}

#[tokio::test]
async fn test_comment_thread() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[fixtures::article("a1", "hello", "c1", "u1")]])
        .append_query_results([vec![
            fixtures::comment("m1", "a1", None, 0),
            fixtures::comment("m2", "a1", Some("m1"), 1),
        ]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/articles/hello/comments")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"][1]["depth"], 1);
    assert_eq!(body["data"][1]["parentId"], "m1");
}

//! Router-level tests for the request surface: identity preconditions,
//! routing, and media-type handling.
//!
//! The pool is created lazily and every request here fails its precondition
//! before a statement would run, so no database is needed.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use blueprint_sdk::{entity_routes, AppState, EntityRegistry, EntitySchema};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn test_app() -> Router {
    let registry = EntityRegistry::new(vec![
        EntitySchema::builder("address", "addresses")
            .text("street")
            .text("city")
            .text("provinceOrState")
            .text("country")
            .build()
            .unwrap(),
        EntitySchema::builder("student", "students")
            .text("name")
            .text("email")
            .date("birthday")
            .build()
            .unwrap(),
    ])
    .unwrap();
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy("postgres://localhost/blueprint_unreachable")
        .unwrap();
    Router::new().nest(
        "/api",
        entity_routes(AppState {
            pool,
            registry: Arc::new(registry),
        }),
    )
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn error_code(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    value["error"]["code"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn create_with_an_id_is_a_bad_request() {
    let response = test_app()
        .oneshot(json_request(
            "POST",
            "/api/addresses",
            json!({"id": 7, "street": "Main"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "bad_request");
}

#[tokio::test]
async fn unknown_segment_is_not_found() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/widgets")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(response).await, "not_found");
}

#[tokio::test]
async fn replace_with_a_mismatched_body_id_is_a_bad_request() {
    let response = test_app()
        .oneshot(json_request(
            "PUT",
            "/api/addresses/1",
            json!({"id": 2, "street": "Main"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn replace_without_a_body_id_is_a_bad_request() {
    let response = test_app()
        .oneshot(json_request("PUT", "/api/addresses/1", json!({"street": "Main"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn replace_without_a_path_id_is_method_not_allowed() {
    let response = test_app()
        .oneshot(json_request("PUT", "/api/addresses", json!({"id": 1})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn patch_requires_a_json_media_type() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/api/addresses/1")
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("street=Z"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn patch_accepts_merge_patch_media_type_and_checks_ids() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/api/addresses/1")
                .header(header::CONTENT_TYPE, "application/merge-patch+json")
                .body(Body::from(json!({"id": 9, "street": "Z"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_numeric_path_id_is_a_bad_request() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/addresses/abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_date_field_is_a_bad_request() {
    let response = test_app()
        .oneshot(json_request(
            "POST",
            "/api/students",
            json!({"name": "Ada", "birthday": "not-a-date"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_sort_field_is_a_bad_request() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/addresses?sort=bogus,asc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

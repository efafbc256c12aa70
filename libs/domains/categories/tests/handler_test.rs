//! Handler tests for the categories router
//!
//! Requests go through `handlers::router` backed by the in-memory repository:
//! - JSON in/out
//! - status codes
//! - the `{code, error, message, details}` error body

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain_categories::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn app() -> Router {
    handlers::router(CategoryService::new(InMemoryCategoryRepository::new()))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_create_category_returns_201() {
    let response = app()
        .oneshot(json_request("POST", "/", json!({ "name": "Tools" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let category: Category = json_body(response.into_body()).await;
    assert_eq!(category.name, "Tools");
}

#[tokio::test]
async fn test_create_category_validates_name() {
    let response = app()
        .oneshot(json_request("POST", "/", json!({ "name": "" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(body["code"], 1001);
    assert!(body["details"]["name"].is_array());
}

#[tokio::test]
async fn test_duplicate_category_returns_409() {
    let app = app();

    let first = app
        .clone()
        .oneshot(json_request("POST", "/", json!({ "name": "Tools" })))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .oneshot(json_request("POST", "/", json!({ "name": "Tools" })))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let body: Value = json_body(second.into_body()).await;
    assert_eq!(body["error"], "CONFLICT");
}

#[tokio::test]
async fn test_get_unknown_category_returns_404() {
    let uri = format!("/{}", uuid::Uuid::now_v7());
    let response = app().oneshot(empty_request("GET", &uri)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_with_malformed_id_returns_400() {
    let response = app()
        .oneshot(empty_request("GET", "/not-a-uuid"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["error"], "INVALID_UUID");
}

#[tokio::test]
async fn test_update_then_list_then_delete() {
    let app = app();

    let created: Category = json_body(
        app.clone()
            .oneshot(json_request("POST", "/", json!({ "name": "Garden" })))
            .await
            .unwrap()
            .into_body(),
    )
    .await;

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/{}", created.id),
            json!({ "name": "Gardening" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Category = json_body(response.into_body()).await;
    assert_eq!(updated.name, "Gardening");

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/?limit=10"))
        .await
        .unwrap();
    let listed: Vec<Category> = json_body(response.into_body()).await;
    assert_eq!(listed.len(), 1);

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", &format!("/{}", created.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(empty_request("DELETE", &format!("/{}", created.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

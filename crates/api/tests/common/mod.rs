//! Common test utilities for integration tests.
//!
//! The router is driven in-process over the in-memory zone store, so no
//! database is needed.

#![allow(dead_code)]

use std::sync::Arc;

use aerosentinel_api::{app::create_app, config::Config};
use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use domain::services::ZoneRegistry;
use fake::{faker::lorem::en::Word, Fake};
use persistence::MemoryZoneStore;
use tower::ServiceExt;

/// Test configuration backed by the in-memory store.
pub fn test_config() -> Config {
    Config::load_for_test(&[]).expect("Failed to build test config")
}

/// A router plus the registry behind it.
pub struct TestApp {
    pub router: Router,
    pub registry: ZoneRegistry,
}

/// Create a test application over a fresh in-memory store.
pub fn create_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryZoneStore::new(config.realtime.change_buffer));
    let registry = ZoneRegistry::new(store);
    let router = create_app(config, registry.clone(), None);
    TestApp { router, registry }
}

/// A random zone name.
pub fn unique_zone_name() -> String {
    format!("{} {}", Word().fake::<String>(), uuid::Uuid::new_v4().simple())
}

/// A 4° x 3° right triangle near the origin.
pub fn triangle_points() -> serde_json::Value {
    serde_json::json!([
        {"lat": 0.0, "lng": 0.0},
        {"lat": 4.0, "lng": 0.0},
        {"lat": 0.0, "lng": 3.0}
    ])
}

/// Build a JSON request.
pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a GET request.
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Build a DELETE request.
pub fn delete_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Parse response body as JSON.
pub async fn parse_response_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}

/// Create a triangle zone via the API and return its JSON.
pub async fn create_test_zone(app: &Router, name: &str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/zones",
            serde_json::json!({"name": name, "points": triangle_points()}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    parse_response_body(response).await
}

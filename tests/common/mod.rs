//! Shared helpers for the API integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tower::ServiceExt;

use appbuilder::ai::AiService;
use appbuilder::config::Config;
use appbuilder::database::{init_db, AppState};
use appbuilder::route::create_app;

/// Builds the application on a temporary database
///
/// The file handle must outlive the router.
pub fn setup_test_app() -> (Router, NamedTempFile) {
    setup_test_app_with(AiService::catalog())
}

pub fn setup_test_app_with(ai: AiService) -> (Router, NamedTempFile) {
    let temp_db = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = temp_db.path().to_str().unwrap();
    let db = init_db(db_path).expect("Failed to initialize test database");
    let state = AppState::new(db, Config::default(), ai);
    (create_app(state), temp_db)
}

/// Parses a response body as JSON
pub async fn response_json(body: Body) -> Value {
    let bytes = body
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();

    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}

/// Sends one request and returns the status with the decoded body
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, response_json(response.into_body()).await)
}

/// Registers a user and returns their token
pub async fn register(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": email, "password": "secret123", "name": "Test User" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

/// Creates an app and returns its JSON
pub async fn create_app_for(app: &Router, token: &str, name: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/apps",
        Some(token),
        Some(json!({ "name": name, "type": "todo" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create app failed: {body}");
    body["app"].clone()
}

//! Integration tests for the app builder API
//!
//! These tests drive the full router (routing, authentication, handlers and
//! the redb store) through `tower::ServiceExt::oneshot`.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{create_app_for, register, send, setup_test_app};

#[tokio::test]
async fn test_create_app_success() {
    let (app, _temp_db) = setup_test_app();
    let token = register(&app, "owner@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/apps",
        Some(&token),
        Some(json!({ "name": "My Tasks", "description": "Things to do", "type": "todo" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "App created successfully");
    let created = &body["app"];
    assert_eq!(created["name"], "My Tasks");
    assert_eq!(created["type"], "todo");
    assert_eq!(created["version"], 1);
    assert_eq!(created["isPublic"], false);
    assert!(created["slug"].as_str().unwrap().starts_with("my-tasks-"));
    assert_eq!(created["layout"]["components"], json!([]));
    assert_eq!(created["layout"]["gridSize"], 20);
}

#[tokio::test]
async fn test_create_app_requires_name() {
    let (app, _temp_db) = setup_test_app();
    let token = register(&app, "owner@example.com").await;

    let (status, body) = send(&app, "POST", "/api/apps", Some(&token), Some(json!({ "name": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "App name is required");
}

#[tokio::test]
async fn test_apps_require_authentication() {
    let (app, _temp_db) = setup_test_app();

    let (status, body) = send(&app, "GET", "/api/apps", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
}

#[tokio::test]
async fn test_list_apps_is_scoped_and_strips_component_data() {
    let (app, _temp_db) = setup_test_app();
    let alice = register(&app, "alice@example.com").await;
    let bob = register(&app, "bob@example.com").await;

    let first = create_app_for(&app, &alice, "First").await;
    create_app_for(&app, &alice, "Second").await;
    create_app_for(&app, &bob, "Bob's").await;

    let layout = json!({
        "components": [{
            "id": "text-1",
            "type": "text",
            "position": { "x": 0, "y": 0, "width": 200, "height": 100 },
            "data": { "cached": [1, 2, 3] }
        }],
        "gridSize": 20
    });
    let id = first["id"].as_str().unwrap();
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/apps/{id}"),
        Some(&alice),
        Some(json!({ "layout": layout })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/api/apps", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let apps = body["apps"].as_array().unwrap();
    assert_eq!(apps.len(), 2);
    // most recently updated first
    assert_eq!(apps[0]["name"], "First");
    assert_eq!(apps[0]["layout"]["components"][0]["id"], "text-1");
    assert!(apps[0]["layout"]["components"][0].get("data").is_none());

    // the full app still carries the data
    let (_, body) = send(&app, "GET", &format!("/api/apps/{id}"), Some(&alice), None).await;
    assert_eq!(body["app"]["layout"]["components"][0]["data"]["cached"], json!([1, 2, 3]));
}

#[tokio::test]
async fn test_get_app_of_other_user_is_not_found() {
    let (app, _temp_db) = setup_test_app();
    let alice = register(&app, "alice@example.com").await;
    let bob = register(&app, "bob@example.com").await;
    let created = create_app_for(&app, &alice, "Private").await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(&app, "GET", &format!("/api/apps/{id}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "App not found");

    let (status, _) = send(&app, "GET", "/api/apps/does-not-exist", Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/api/apps/{id}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_app_bumps_version_and_checks_expected_version() {
    let (app, _temp_db) = setup_test_app();
    let token = register(&app, "owner@example.com").await;
    let created = create_app_for(&app, &token, "Versioned").await;
    let uri = format!("/api/apps/{}", created["id"].as_str().unwrap());

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({ "name": "Renamed", "expectedVersion": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "App updated successfully");
    assert_eq!(body["app"]["name"], "Renamed");
    assert_eq!(body["app"]["version"], 2);

    // a second writer still holding version 1
    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({ "name": "Stale", "expectedVersion": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    // without a version the last write wins
    let (status, body) = send(&app, "PUT", &uri, Some(&token), Some(json!({ "description": "d" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["app"]["name"], "Renamed");
    assert_eq!(body["app"]["version"], 3);
}

#[tokio::test]
async fn test_visibility_and_public_view() {
    let (app, _temp_db) = setup_test_app();
    let token = register(&app, "owner@example.com").await;
    let created = create_app_for(&app, &token, "Showcase").await;
    let id = created["id"].as_str().unwrap();
    let slug = created["slug"].as_str().unwrap();
    let public_uri = format!("/api/apps/{slug}/public");

    let (status, body) = send(&app, "GET", &public_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "App not found or not public");

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/apps/{id}/visibility"),
        Some(&token),
        Some(json!({ "isPublic": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "App published successfully");
    assert_eq!(body["app"]["isPublic"], true);

    let (status, body) = send(&app, "GET", &public_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["app"]["id"], id);
    assert_eq!(body["app"]["analytics"]["views"], 1);
    assert_eq!(body["owner"]["name"], "Test User");

    // a logged-in viewer counts too
    let (_, body) = send(&app, "GET", &public_uri, Some(&token), None).await;
    assert_eq!(body["app"]["analytics"]["views"], 2);

    let (_, body) = send(
        &app,
        "PATCH",
        &format!("/api/apps/{id}/visibility"),
        Some(&token),
        Some(json!({ "isPublic": false })),
    )
    .await;
    assert_eq!(body["message"], "App unpublished successfully");

    let (status, _) = send(&app, "GET", &public_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_app_removes_its_records() {
    let (app, _temp_db) = setup_test_app();
    let token = register(&app, "owner@example.com").await;
    let created = create_app_for(&app, &token, "Short-lived").await;
    let id = created["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/data/{id}"),
        Some(&token),
        Some(json!({ "collection": "notes", "data": { "text": "hello" } })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "DELETE", &format!("/api/apps/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "App deleted successfully");

    let (status, _) = send(&app, "GET", &format!("/api/apps/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "GET", &format!("/api/data/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "App not found");

    let (_, body) = send(&app, "GET", "/api/apps", Some(&token), None).await;
    assert_eq!(body["apps"], json!([]));
}

#[tokio::test]
async fn test_same_name_gets_distinct_slugs() {
    let (app, _temp_db) = setup_test_app();
    let token = register(&app, "owner@example.com").await;

    let mut slugs = Vec::new();
    for _ in 0..5 {
        let created = create_app_for(&app, &token, "Twin").await;
        slugs.push(created["slug"].as_str().unwrap().to_string());
    }
    slugs.sort();
    slugs.dedup();
    assert_eq!(slugs.len(), 5);
}

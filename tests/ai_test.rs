mod common;

use std::time::Duration;

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};

use appbuilder::ai::{AiService, LlmClient};
use common::{register, send, setup_test_app, setup_test_app_with};

/// Serves `router` on an ephemeral port and returns its base URL
async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// A chat-completions endpoint that always answers with `content`
fn chat_stub(content: &'static str) -> Router {
    Router::new().route(
        "/v1/chat/completions",
        post(move |Json(_): Json<Value>| async move {
            Json(json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] }))
        }),
    )
}

fn llm_service(base_url: &str) -> AiService {
    let client = LlmClient::new(
        &format!("{base_url}/v1/chat/completions"),
        Some("test-key".to_string()),
        "test-model",
        Duration::from_secs(5),
    )
    .unwrap();
    AiService::with_llm(client)
}

#[tokio::test]
async fn test_catalog_suggestions_and_usage_count() {
    let (app, _temp_db) = setup_test_app();
    let token = register(&app, "ai@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/ai/suggest-widgets",
        Some(&token),
        Some(json!({ "appType": "todo", "description": "personal tasks" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let suggestions = body["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 4);
    assert_eq!(suggestions[0], json!({ "type": "form", "name": "Task Creator", "description": "Form to add new tasks" }));

    let (_, body) = send(&app, "POST", "/api/ai/suggest-widgets", Some(&token), Some(json!({}))).await;
    assert_eq!(body["suggestions"].as_array().unwrap().len(), 3);

    let (_, body) = send(&app, "GET", "/api/auth/profile", Some(&token), None).await;
    assert_eq!(body["user"]["apiUsage"]["monthly"], 2);
}

#[tokio::test]
async fn test_catalog_template_and_optimize() {
    let (app, _temp_db) = setup_test_app();
    let token = register(&app, "ai@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/ai/generate-template",
        Some(&token),
        Some(json!({ "appType": "todo" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["template"]["name"], "Task Management App");
    let components = body["template"]["layout"]["components"].as_array().unwrap();
    assert_eq!(components.len(), 2);
    assert_eq!(components[0]["type"], "form");
    assert_eq!(components[1]["type"], "table");

    let (status, body) = send(
        &app,
        "POST",
        "/api/ai/optimize-layout",
        Some(&token),
        Some(json!({ "components": [{ "id": "a", "type": "text", "position": { "x": -40, "y": 20 } }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let optimized = &body["optimizedLayout"];
    assert_eq!(optimized["suggestions"].as_array().unwrap().len(), 3);
    assert_eq!(optimized["improvements"][0]["position"], json!({ "x": 0, "y": 20 }));

    let (_, body) = send(&app, "GET", "/api/auth/profile", Some(&token), None).await;
    assert_eq!(body["user"]["apiUsage"]["monthly"], 2);
}

#[tokio::test]
async fn test_ai_requires_authentication() {
    let (app, _temp_db) = setup_test_app();

    let (status, _) = send(&app, "POST", "/api/ai/suggest-widgets", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_llm_answer_in_code_fence_is_used() {
    let upstream = spawn(chat_stub(
        "Here you go:\n```json\n{\"suggestions\": [{\"type\": \"chart\", \"name\": \"Spending\", \"description\": \"Monthly totals\"}, {\"type\": \"hologram\", \"name\": \"Nope\"}]}\n```",
    ))
    .await;
    let (app, _temp_db) = setup_test_app_with(llm_service(&upstream));
    let token = register(&app, "ai@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/ai/suggest-widgets",
        Some(&token),
        Some(json!({ "appType": "budget" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["suggestions"],
        json!([{ "type": "chart", "name": "Spending", "description": "Monthly totals" }])
    );
}

#[tokio::test]
async fn test_llm_failure_degrades_to_empty_results() {
    let failing = Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream down") }),
    );
    let upstream = spawn(failing).await;
    let (app, _temp_db) = setup_test_app_with(llm_service(&upstream));
    let token = register(&app, "ai@example.com").await;

    let (status, body) = send(&app, "POST", "/api/ai/suggest-widgets", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggestions"], json!([]));

    let (status, body) = send(&app, "POST", "/api/ai/generate-template", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["template"], Value::Null);

    let (status, body) = send(
        &app,
        "POST",
        "/api/ai/optimize-layout",
        Some(&token),
        Some(json!({ "components": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["optimizedLayout"], json!({ "suggestions": [] }));
}

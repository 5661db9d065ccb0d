//! Admin teaching surface, end to end
//!
//! Rules taught over HTTP must take effect on the very next call turn and
//! survive in the JSON rule book.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

fn test_app() -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = chris::AssistantConfig {
        rules_path: dir.path().join("rules.json"),
        ..Default::default()
    };
    let assistant = Arc::new(chris::Assistant::new(config).unwrap());
    (server::routes::router(assistant), dir)
}

async fn request(
    app: &Router,
    method: Method,
    uri: &str,
    content_type: &str,
    body: &str,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, value)
}

async fn teach(app: &Router, instruction: &str) -> (StatusCode, serde_json::Value) {
    let body = serde_json::json!({ "instruction": instruction }).to_string();
    request(app, Method::POST, "/admin/rules", "application/json", &body).await
}

#[tokio::test]
async fn teaching_extracts_trigger_and_response() {
    let (app, _dir) = test_app();

    let (status, body) = teach(&app, "when someone says hello respond with hi there").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["trigger"], "hello");
    assert_eq!(body["data"]["response"], "hi there");
}

#[tokio::test]
async fn unparseable_instruction_is_reported() {
    let (app, _dir) = test_app();

    let (status, body) = teach(&app, "please be nicer to callers").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("no rule template matched"));
}

#[tokio::test]
async fn listing_and_stats_reflect_taught_rules() {
    let (app, _dir) = test_app();

    teach(&app, "when someone says hello respond with hi there").await;
    teach(&app, "add response for good morning: Morning!").await;
    teach(&app, "not an instruction at all").await;

    let (status, body) = request(&app, Method::GET, "/admin/rules", "application/json", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, stats) = request(&app, Method::GET, "/admin/stats", "application/json", "").await;
    assert_eq!(stats["data"]["rules"], 2);
    assert_eq!(stats["data"]["instructions_seen"], 3);
    assert_eq!(stats["data"]["active_calls"], 0);
}

#[tokio::test]
async fn taught_rule_answers_the_next_call_turn() {
    let (app, _dir) = test_app();

    teach(
        &app,
        "when someone says front desk respond with You've reached the front desk!",
    )
    .await;

    let call = Request::builder()
        .method(Method::POST)
        .uri("/voice")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("CallSid=CA800&From=%2B15551230000"))
        .unwrap();
    app.clone().oneshot(call).await.unwrap();

    let speech = Request::builder()
        .method(Method::POST)
        .uri("/handle-speech/CA800")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(
            "SpeechResult=is+this+the+front+desk&From=%2B15551230000",
        ))
        .unwrap();
    let response = app.clone().oneshot(speech).await.unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let twiml = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(twiml.contains("You&apos;ve reached the front desk!"));
}

//! Credential validation happens before any network call.
//!
//! This file is its own test process, so the credential variables are
//! never set by other tests and the checks below run in one sequence
//! to keep the process environment deterministic.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use reverie_relay::memory::HttpMemoryService;
use reverie_relay::store::HttpKvStore;
use reverie_relay::upstream::UpstreamClient;
use reverie_relay::{router, AppState};

#[tokio::test]
async fn missing_credentials_fail_before_any_upstream_call() {
    std::env::remove_var("INFERENCE_API_KEY");
    std::env::remove_var("MEMORY_API_KEY");

    // A live mock provider that counts calls; it must never be reached.
    let calls = Arc::new(Mutex::new(0usize));
    let calls_handle = Arc::clone(&calls);
    let upstream = Router::new().route(
        "/chat/completions",
        post(move || {
            let calls = Arc::clone(&calls_handle);
            async move {
                *calls.lock().unwrap() += 1;
                Json(json!({ "choices": [] }))
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, upstream).await.unwrap();
    });

    let state = Arc::new(AppState {
        upstream: UpstreamClient::new(format!("http://{addr}")),
        store: Arc::new(HttpKvStore::new(format!("http://{addr}"))),
        memory: Arc::new(HttpMemoryService::new(format!("http://{addr}"))),
    });

    let request_body = json!({
        "model": "test-model",
        "messages": [{ "role": "user", "content": "hi" }],
    });

    // Neither secret set: the error names both variables.
    let response = post_chat(router(Arc::clone(&state)), &request_body).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"]["type"], "configuration_error");
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("INFERENCE_API_KEY"), "message: {message}");
    assert!(message.contains("MEMORY_API_KEY"), "message: {message}");

    // Only the inference key set: the error names the remaining one.
    std::env::set_var("INFERENCE_API_KEY", "test-inference-key");
    let response = post_chat(router(Arc::clone(&state)), &request_body).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("MEMORY_API_KEY"), "message: {message}");
    assert!(!message.contains("INFERENCE_API_KEY"), "message: {message}");

    assert_eq!(*calls.lock().unwrap(), 0, "no upstream call may happen");
}

async fn post_chat(app: Router, body: &Value) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/v1/chat/completions")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

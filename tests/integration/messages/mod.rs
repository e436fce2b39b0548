//! Message history endpoint integration tests

use axum::http::{Method, StatusCode};
use serde_json::json;
use threadchat_conversations::Message;

use crate::common::{json_request, parse_body, TestApp};

#[tokio::test]
async fn test_unseen_thread_has_empty_history() {
    let app = TestApp::new();

    let resp = app
        .send(json_request(Method::GET, "/v1/threads/nobody/messages", None))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(parse_body(resp).await, json!([]));
}

#[tokio::test]
async fn test_history_lists_turns_oldest_first() {
    let app = TestApp::new();
    app.invoke("t1", json!({"user_text": "first"})).await;
    app.invoke("t1", json!({"user_text": "second"})).await;

    let resp = app
        .send(json_request(Method::GET, "/v1/threads/t1/messages", None))
        .await;

    assert_eq!(
        parse_body(resp).await,
        json!([
            {"role": "user", "content": "first"},
            {"role": "assistant", "content": "Mock response to: first"},
            {"role": "user", "content": "second"},
            {"role": "assistant", "content": "Mock response to: second"},
        ])
    );
}

#[tokio::test]
async fn test_history_includes_seeded_system_message() {
    let app = TestApp::new();
    app.seed("t1", vec![Message::system("you're a good assistant")])
        .await
        .unwrap();

    let resp = app
        .send(json_request(Method::GET, "/v1/threads/t1/messages", None))
        .await;

    let body = parse_body(resp).await;
    assert_eq!(body[0]["role"], "system");
    assert_eq!(body[0]["content"], "you're a good assistant");
}

#[tokio::test]
async fn test_reading_history_does_not_mutate() {
    let app = TestApp::new();
    app.invoke("t1", json!({"user_text": "hi"})).await;

    let first = parse_body(
        app.send(json_request(Method::GET, "/v1/threads/t1/messages", None))
            .await,
    )
    .await;
    let second = parse_body(
        app.send(json_request(Method::GET, "/v1/threads/t1/messages", None))
            .await,
    )
    .await;

    assert_eq!(first, second);
    assert_eq!(app.history("t1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_reading_unseen_thread_does_not_create_it() {
    let app = TestApp::new();

    app.send(json_request(Method::GET, "/v1/threads/ghost/messages", None))
        .await;

    let resp = app.send(json_request(Method::GET, "/v1/threads", None)).await;
    assert_eq!(parse_body(resp).await, json!([]));
}

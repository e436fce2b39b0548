//! End-to-end turn invariants exercised over HTTP
//!
//! Each test drives `/v1/threads/{id}/invoke` and then inspects the store
//! directly, so history effects are checked independently of the API.

use serde_json::json;
use threadchat_conversations::{Message, MessageRole, OrchestratorConfig};
use threadchat_llm::{LlmError, LlmRole, MockLlmService};

use crate::common::TestApp;

fn seeded_transcript(pairs: usize) -> Vec<Message> {
    (0..pairs)
        .flat_map(|i| {
            [
                Message::user(format!("u{}", i)).unwrap(),
                Message::assistant(format!("a{}", i)),
            ]
        })
        .collect()
}

#[test_log::test(tokio::test)]
async fn test_fresh_thread_gains_user_and_assistant_messages() {
    let app = TestApp::new();

    let (status, body) = app.invoke("t1", json!({"user_text": "hi"})).await;

    assert_eq!(status, 200);
    let history = app.history("t1").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0], Message::user("hi").unwrap());
    assert_eq!(history[1].role, MessageRole::Assistant);
    assert_eq!(body["reply_text"], history[1].content.as_str());
}

#[tokio::test]
async fn test_invalid_input_leaves_history_untouched() {
    let app = TestApp::new();
    app.invoke("t1", json!({"user_text": "hi"})).await;

    let (status, _) = app.invoke("t1", json!({"user_text": ""})).await;

    assert_eq!(status, 400);
    assert_eq!(app.history("t1").await.unwrap().len(), 2);
    assert_eq!(app.llm.request_count(), 1);
}

#[tokio::test]
async fn test_long_thread_sends_trimmed_window_starting_on_user() {
    let app = TestApp::new();
    app.seed("t1", seeded_transcript(6)).await.unwrap();

    let (status, _) = app.invoke("t1", json!({"user_text": "u6"})).await;
    assert_eq!(status, 200);

    // 13 candidates; the last 10 start on "a1", so the window begins at "u2"
    let request = app.llm.last_request().unwrap();
    assert_eq!(request.messages.len(), 9);
    assert_eq!(request.messages[0].role, LlmRole::User);
    assert_eq!(request.messages[0].content, "u2");
    assert_eq!(request.messages.last().unwrap().content, "u6");

    // Trimming shapes the prompt only; the store keeps everything
    assert_eq!(app.history("t1").await.unwrap().len(), 14);
}

#[tokio::test]
async fn test_window_never_exceeds_maximum_across_many_turns() {
    let app = TestApp::new();

    for i in 0..15 {
        let (status, _) = app
            .invoke("t1", json!({"user_text": format!("turn {}", i)}))
            .await;
        assert_eq!(status, 200);
    }

    for request in app.llm.requests() {
        assert!(request.messages.len() <= 10);
        assert_eq!(request.messages[0].role, LlmRole::User);
    }
    assert_eq!(app.history("t1").await.unwrap().len(), 30);
}

#[tokio::test]
async fn test_model_failure_rolls_back_user_message() {
    let app = TestApp::failing(LlmError::Request("connection refused".to_string()));
    app.seed("t1", seeded_transcript(1)).await.unwrap();

    let (status, body) = app.invoke("t1", json!({"user_text": "hello?"})).await;

    assert_eq!(status, 503);
    assert_eq!(body["error"]["code"], "MODEL_UNAVAILABLE");
    assert_eq!(app.history("t1").await.unwrap(), seeded_transcript(1));
}

#[tokio::test]
async fn test_model_failure_retains_user_message_when_configured() {
    let config = OrchestratorConfig {
        rollback_on_failure: false,
        ..OrchestratorConfig::default()
    };
    let app = TestApp::with(MockLlmService::failing(LlmError::Timeout), config);

    let (status, _) = app.invoke("t1", json!({"user_text": "hello?"})).await;

    assert_eq!(status, 503);
    let history = app.history("t1").await.unwrap();
    assert_eq!(history, vec![Message::user("hello?").unwrap()]);
}

#[tokio::test]
async fn test_threads_never_share_history() {
    let app = TestApp::new();

    app.invoke("t1", json!({"user_text": "secret for t1"})).await;
    app.invoke("t2", json!({"user_text": "hello from t2"})).await;

    let t2 = app.history("t2").await.unwrap();
    assert_eq!(t2.len(), 2);
    assert!(t2.iter().all(|m| !m.content.contains("t1")));

    let last = app.llm.last_request().unwrap();
    assert_eq!(last.messages.len(), 1);
    assert_eq!(last.messages[0].content, "hello from t2");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_on_one_thread_keep_pairs_adjacent() {
    let app = std::sync::Arc::new(TestApp::new());

    let mut handles = Vec::new();
    for i in 0..6 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            app.invoke("shared", json!({"user_text": format!("q{}", i)}))
                .await
        }));
    }
    for handle in handles {
        let (status, _) = handle.await.unwrap();
        assert_eq!(status, 200);
    }

    let history = app.history("shared").await.unwrap();
    assert_eq!(history.len(), 12);
    for pair in history.chunks(2) {
        assert_eq!(pair[0].role, MessageRole::User);
        assert_eq!(
            pair[1].content,
            format!("Mock response to: {}", pair[0].content)
        );
    }
}

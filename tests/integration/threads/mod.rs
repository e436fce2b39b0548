//! Thread endpoint integration tests: invoke, create, list

use axum::http::{Method, StatusCode};
use serde_json::json;
use threadchat_llm::LlmError;

use crate::common::{body_text, json_request, parse_body, TestApp};

mod test_invoke {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_invoke_returns_reply() {
        let app = TestApp::new();

        let (status, body) = app.invoke("t1", json!({"user_text": "hi"})).await;

        assert_eq!(status, 200);
        assert_eq!(body["reply_text"], "Mock response to: hi");
    }

    #[tokio::test]
    async fn test_invoke_passes_language_to_prompt() {
        let app = TestApp::new();

        let (status, _) = app
            .invoke("t1", json!({"user_text": "hola", "language": "Spanish"}))
            .await;

        assert_eq!(status, 200);
        let request = app.llm.last_request().unwrap();
        assert!(request.system_prompt.unwrap().ends_with("in Spanish."));
    }

    #[tokio::test]
    async fn test_invoke_without_language_uses_english() {
        let app = TestApp::new();

        app.invoke("t1", json!({"user_text": "hello"})).await;

        let request = app.llm.last_request().unwrap();
        assert!(request.system_prompt.unwrap().ends_with("in English."));
    }

    #[tokio::test]
    async fn test_invoke_empty_text_is_validation_error() {
        let app = TestApp::new();

        let (status, body) = app.invoke("t1", json!({"user_text": ""})).await;

        assert_eq!(status, 400);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(app.llm.request_count(), 0);
    }

    #[tokio::test]
    async fn test_invoke_whitespace_text_is_validation_error() {
        let app = TestApp::new();

        let (status, body) = app.invoke("t1", json!({"user_text": "  \t "})).await;

        assert_eq!(status, 400);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(app.history("t1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invoke_missing_text_is_bad_request() {
        let app = TestApp::new();

        let (status, _) = app.invoke("t1", json!({"language": "French"})).await;

        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_invoke_malformed_json_is_bad_request() {
        let app = TestApp::new();
        let req = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/v1/threads/t1/invoke")
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap();

        let resp = app.send(req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invoke_model_failure_is_service_unavailable() {
        let app = TestApp::failing(LlmError::RateLimit);

        let (status, body) = app.invoke("t1", json!({"user_text": "hi"})).await;

        assert_eq!(status, 503);
        assert_eq!(body["error"]["code"], "MODEL_UNAVAILABLE");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("rate limit"));
    }
}

mod test_create_thread {
    use super::*;

    #[tokio::test]
    async fn test_create_thread_returns_201_with_fresh_ids() {
        let app = TestApp::new();

        let first = app
            .send(json_request(Method::POST, "/v1/threads", None))
            .await;
        assert_eq!(first.status(), StatusCode::CREATED);
        let first = parse_body(first).await;

        let second = parse_body(
            app.send(json_request(Method::POST, "/v1/threads", None))
                .await,
        )
        .await;

        let first_id = first["thread_id"].as_str().unwrap();
        let second_id = second["thread_id"].as_str().unwrap();
        assert_eq!(first_id.len(), 36);
        assert_ne!(first_id, second_id);
    }

    #[tokio::test]
    async fn test_minting_does_not_create_history() {
        let app = TestApp::new();

        app.send(json_request(Method::POST, "/v1/threads", None))
            .await;

        let resp = app.send(json_request(Method::GET, "/v1/threads", None)).await;
        assert_eq!(parse_body(resp).await, json!([]));
    }
}

mod test_list_threads {
    use super::*;

    #[tokio::test]
    async fn test_list_threads_sorted() {
        let app = TestApp::new();
        app.invoke("user-2", json!({"user_text": "hi"})).await;
        app.invoke("user-1", json!({"user_text": "hi"})).await;

        let resp = app.send(json_request(Method::GET, "/v1/threads", None)).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(parse_body(resp).await, json!(["user-1", "user-2"]));
    }
}

mod test_infrastructure {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let app = TestApp::new();
        let resp = app.send(json_request(Method::GET, "/health", None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "OK");
    }

    #[tokio::test]
    async fn test_root_banner() {
        let app = TestApp::new();
        let resp = app.send(json_request(Method::GET, "/", None)).await;
        assert!(body_text(resp).await.starts_with("Threadchat API"));
    }
}

//! Common test utilities and fixtures for integration tests
//!
//! This module provides shared infrastructure for all integration tests:
//! - Test application setup around the mock model service
//! - Request builders and response parsing
//! - Direct access to the history store for seeding and assertions

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    http::{Method, Request, Response},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use threadchat_conversations::{
    HistoryStore, InMemoryHistoryStore, Message, OrchestratorConfig, ThreadId, ThreadOrchestrator,
};
use threadchat_llm::{LlmError, MockLlmService};

/// Test application: composed router plus handles on its collaborators
pub struct TestApp {
    pub llm: MockLlmService,
    pub store: Arc<InMemoryHistoryStore>,
    pub orchestrator: Arc<ThreadOrchestrator>,
}

impl TestApp {
    /// App with a mock model that always answers
    pub fn new() -> Self {
        Self::with(MockLlmService::new(), OrchestratorConfig::default())
    }

    /// App whose model always fails with `error`
    pub fn failing(error: LlmError) -> Self {
        Self::with(MockLlmService::failing(error), OrchestratorConfig::default())
    }

    pub fn with(llm: MockLlmService, config: OrchestratorConfig) -> Self {
        let store = Arc::new(InMemoryHistoryStore::new());
        let orchestrator = Arc::new(ThreadOrchestrator::new(
            store.clone(),
            Arc::new(llm.clone()),
            config,
        ));
        Self {
            llm,
            store,
            orchestrator,
        }
    }

    /// Router over this app's shared state
    pub fn test_router(&self) -> Router {
        threadchat_app::build_router(self.orchestrator.clone())
    }

    /// Send one request through a fresh router clone
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.test_router()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Run a turn over HTTP and return `(status, body)`
    pub async fn invoke(&self, thread_id: &str, body: Value) -> (u16, Value) {
        let req = json_request(
            Method::POST,
            &format!("/v1/threads/{}/invoke", thread_id),
            Some(body),
        );
        let resp = self.send(req).await;
        let status = resp.status().as_u16();
        (status, parse_body(resp).await)
    }

    /// Thread history read straight from the store
    pub async fn history(&self, thread_id: &str) -> Result<Vec<Message>> {
        let thread_id = ThreadId::parse(thread_id)?;
        Ok(self.store.get(&thread_id).await?)
    }

    /// Append messages directly, bypassing the orchestrator
    pub async fn seed(&self, thread_id: &str, messages: Vec<Message>) -> Result<()> {
        let thread_id = ThreadId::parse(thread_id)?;
        for message in messages {
            self.store.append(&thread_id, message).await?;
        }
        Ok(())
    }
}

/// Helper: build a request with an optional JSON body
pub fn json_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);

    if let Some(b) = body {
        builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&b).unwrap()))
            .unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    }
}

/// Helper: parse response body as JSON Value
pub async fn parse_body(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Helper: read response body as text
pub async fn body_text(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

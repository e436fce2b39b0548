//! Threadchat application composition root
//!
//! Wires the history store, the model service and the orchestrator into the
//! conversations router, plus shared infrastructure routes and layers.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use threadchat_conversations::{
    ConversationsState, InMemoryHistoryStore, OrchestratorConfig, ThreadOrchestrator,
};
use threadchat_llm::{LlmConfig, LlmService, LlmServiceFactory};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

/// Maximum accepted request body size
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Create the main application router from environment configuration
pub async fn create_app() -> Result<Router, anyhow::Error> {
    let llm_config = LlmConfig::from_env()?;
    let llm: Arc<dyn LlmService> = Arc::from(LlmServiceFactory::create(llm_config)?);

    let orchestrator_config = OrchestratorConfig::from_env()?;
    tracing::info!(
        max_units = orchestrator_config.trim.max_units,
        unit = ?orchestrator_config.trim.unit,
        default_language = %orchestrator_config.default_language,
        rollback_on_failure = orchestrator_config.rollback_on_failure,
        "Orchestrator configured"
    );

    let orchestrator = ThreadOrchestrator::new(
        Arc::new(InMemoryHistoryStore::new()),
        llm,
        orchestrator_config,
    );

    Ok(build_router(Arc::new(orchestrator)))
}

/// Build the router around an existing orchestrator
pub fn build_router(orchestrator: Arc<ThreadOrchestrator>) -> Router {
    let conversations_state = ConversationsState::new(orchestrator);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { "Threadchat API v0.0.1-SNAPSHOT" }),
        )
        .merge(threadchat_conversations::routes().with_state(conversations_state))
}

/// CORS layer for a comma-separated origin list; permissive when `None`
pub fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    let Some(origins) = origins else {
        return CorsLayer::permissive();
    };

    let allowed: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

/// Reject oversized request bodies
pub fn body_limit_layer() -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(MAX_BODY_BYTES)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
